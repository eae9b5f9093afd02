/*!
 * Batch translation orchestration.
 *
 * This module turns a request into backend calls and back into a result of
 * the same shape. It is split into several submodules:
 *
 * - `batch`: The batch translator and its retry loop
 * - `request`: Request/result shapes, batching and reassembly
 * - `repair`: Response normalization and line-count repair
 * - `signals`: Progress signaling and cancellation
 * - `messages`: Localized host-facing messages
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, RunState};
pub use self::request::{RequestMode, TranslationOutput, TranslationRequest, TranslationResult};
pub use self::signals::{
    CancelCheck, NeverCancel, NullSink, ProgressBarSink, Signal, SignalKind, SignalLog, SignalSink,
};

// Submodules
pub mod batch;
pub mod messages;
pub mod repair;
pub mod request;
pub mod signals;
