/*!
 * Translation backend abstraction.
 *
 * A backend turns an ordered batch of source lines into translated text.
 * For multi-line batches the expected convention is one translated line per
 * input line, newline-separated, but the batch translator never relies on it
 * and repairs whatever comes back.
 *
 * - `FnBackend`: adapter for plain closures
 * - `mock`: scripted backend used by tests and benchmarks
 */

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::BackendError;

/// Common trait for all translation backends
///
/// Implementations must be safe to call repeatedly. Connection pooling,
/// authentication and request formatting are the backend's own business.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate a batch of lines
    ///
    /// # Arguments
    /// * `lines` - The source lines, in order. The per-line fallback calls this
    ///   with a single line.
    ///
    /// # Returns
    /// * `Result<String, BackendError>` - The translated text or a failure.
    ///   Every failure is treated as transient by the caller.
    async fn translate_batch(&self, lines: &[String]) -> Result<String, BackendError>;
}

#[async_trait]
impl<T: TranslationBackend + ?Sized> TranslationBackend for Arc<T> {
    async fn translate_batch(&self, lines: &[String]) -> Result<String, BackendError> {
        (**self).translate_batch(lines).await
    }
}

#[async_trait]
impl<T: TranslationBackend + ?Sized> TranslationBackend for Box<T> {
    async fn translate_batch(&self, lines: &[String]) -> Result<String, BackendError> {
        (**self).translate_batch(lines).await
    }
}

/// Backend built from a synchronous closure
pub struct FnBackend<F> {
    translate: F,
}

impl<F> FnBackend<F>
where
    F: Fn(&[String]) -> Result<String, BackendError> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(translate: F) -> Self {
        Self { translate }
    }
}

#[async_trait]
impl<F> TranslationBackend for FnBackend<F>
where
    F: Fn(&[String]) -> Result<String, BackendError> + Send + Sync,
{
    async fn translate_batch(&self, lines: &[String]) -> Result<String, BackendError> {
        (self.translate)(lines)
    }
}

pub mod mock;
