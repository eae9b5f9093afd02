/*!
 * # batchtrans - batch translation orchestration
 *
 * A Rust library that drives a pluggable translation backend over plain text
 * or subtitle entries, batch by batch, and hands back a result of the same
 * shape as the input.
 *
 * ## Features
 *
 * - Fixed-size batching in input order
 * - Bounded retries with a backoff pause before each retry
 * - Line-count repair: merged-line splitting and per-line fallback
 * - Partial-failure threshold across the whole run
 * - Progress and error signaling, cooperative cancellation
 * - English and Chinese host-facing messages
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Run configuration and host settings lookup
 * - `backend`: The `TranslationBackend` trait and a mock backend
 * - `translation`: Batch orchestration:
 *   - `translation::batch`: The batch translator and retry state machine
 *   - `translation::request`: Request and result shapes
 *   - `translation::repair`: Response shape repair
 *   - `translation::signals`: Progress signaling and cancellation
 * - `subtitle_entry`: Subtitle records and the `TextEntry` trait
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod backend;
pub mod errors;
pub mod language_utils;
pub mod subtitle_entry;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{SettingsSource, ShapePolicy, TranslatorConfig, UiLanguage};
pub use backend::{FnBackend, TranslationBackend};
pub use errors::{BackendError, TranslationError};
pub use subtitle_entry::{SubtitleEntry, TextEntry};
pub use translation::{
    BatchTranslator, CancelCheck, SignalKind, SignalSink, TranslationOutput, TranslationRequest,
    TranslationResult,
};
