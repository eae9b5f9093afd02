/*!
 * Batch translation processing.
 *
 * This module contains the batch translator: it splits a request into
 * fixed-size batches, sends them to the backend one after another, retries
 * failures with a backoff, repairs responses whose line count does not match
 * the batch, and reassembles an output of the same shape as the input.
 *
 * Batches run strictly in order. Output position depends on accumulation
 * order, and the attempt counter and last error are reused from one batch to
 * the next.
 */

use anyhow::Result;
use log::{debug, error, info, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::app_config::TranslatorConfig;
use crate::backend::TranslationBackend;
use crate::errors::{BackendError, TranslationError};
use crate::language_utils;
use crate::subtitle_entry::TextEntry;

use super::messages;
use super::repair::{
    clear_text, fit_to_batch, repair_off_by_one, restore_blank_edges, split_response_lines,
};
use super::request::{
    RequestMode, TranslationOutput, TranslationRequest, TranslationResult, reassemble_entries,
    split_into_batches,
};
use super::signals::{CancelCheck, SignalKind, SignalSink};

/// Mutable state of one run
///
/// Created at the start of `BatchTranslator::run` and dropped when it returns,
/// so concurrent runs on the same translator never share it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunState {
    /// Translated units in output order: one per line for entries,
    /// one per batch for plain text
    pub accumulated: Vec<String>,

    /// Lines that received a translation from the backend (padding excluded)
    pub translated_lines: usize,

    /// Detail of the most recent backend failure
    pub last_error: Option<String>,

    /// Attempts made for the current batch
    pub attempt_count: u32,

    /// Batches recovered by splitting a merged line
    pub repaired_batches: usize,

    /// Batches translated line by line
    pub fallback_batches: usize,

    /// Retries across the whole run
    pub retries: usize,
}

impl RunState {
    /// Create an empty run state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt
    pub fn record_failure(&mut self, error: &BackendError) {
        self.last_error = Some(error.to_string());
    }

    /// Count a new attempt at the current batch and return its number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.attempt_count
    }

    /// Append an accepted batch and get ready for the next one
    pub fn complete_batch(&mut self, lines: Vec<String>, translated: usize) {
        self.accumulated.extend(lines);
        self.translated_lines += translated;
        self.attempt_count = 0;
        self.last_error = None;
    }
}

/// Result of a successful attempt at one batch
#[derive(Debug)]
struct BatchTranslation {
    /// Units to append
    lines: Vec<String>,
    /// How many of `lines` came from the backend
    translated: usize,
    /// The off-by-one repair was applied
    repaired: bool,
    /// The per-line fallback was used
    fell_back: bool,
}

/// How processing of one batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchOutcome {
    Translated,
    Cancelled,
}

/// Sleep unless the duration is zero
async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Batch translator driving a translation backend
pub struct BatchTranslator<B> {
    /// Settings of every run
    config: TranslatorConfig,

    /// The backend that translates one batch
    backend: B,

    /// Identifier used in log lines
    task_id: String,
}

impl<B: TranslationBackend> BatchTranslator<B> {
    /// Create a new batch translator, validating the configuration
    pub fn new(config: TranslatorConfig, backend: B) -> Result<Self> {
        config.validate()?;
        let task_id = config
            .task_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            config,
            backend,
            task_id,
        })
    }

    /// The configuration used by every run
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// The wrapped backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Identifier of the host task
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Translate a request
    ///
    /// Returns the output in the shape of the request, or the partial result
    /// when `cancel` reports true before an attempt. Fails only when a batch
    /// exhausts its retries or, for subtitle entries, when fewer than half of
    /// the lines were translated. Every failure is sent to `signals` as an
    /// error before it is returned.
    pub async fn run<E>(
        &self,
        request: TranslationRequest<E>,
        signals: &dyn SignalSink,
        cancel: &dyn CancelCheck,
    ) -> Result<TranslationResult<E>, TranslationError>
    where
        E: TextEntry + Clone + Send + Sync,
    {
        let mode = request.mode();
        let source_lines = request.source_lines();
        let total = source_lines.len();
        let batches = split_into_batches(&source_lines, self.config.batch_size);
        let mut state = RunState::new();

        info!(
            "[{}] Translating {} lines in {} batches ({} -> {})",
            self.task_id,
            total,
            batches.len(),
            language_utils::display_name(&self.config.source_language_code),
            self.config.target_language
        );
        signals.signal("", SignalKind::ProgressText);

        for (index, batch) in batches.iter().enumerate() {
            let outcome = self
                .process_batch(index, batch, mode, &mut state, signals, cancel)
                .await?;

            if outcome == BatchOutcome::Cancelled {
                info!(
                    "[{}] Translation cancelled after {} of {} batches",
                    self.task_id,
                    index,
                    batches.len()
                );
                return Ok(TranslationResult::Cancelled {
                    partial: state.accumulated,
                });
            }
        }

        info!(
            "[{}] Translated {} of {} lines ({} retries, {} repaired batches, {} line-by-line batches)",
            self.task_id,
            state.translated_lines,
            total,
            state.retries,
            state.repaired_batches,
            state.fallback_batches
        );

        match request {
            TranslationRequest::PlainText(_) => Ok(TranslationResult::Completed(
                TranslationOutput::PlainText(state.accumulated.join("\n")),
            )),
            TranslationRequest::SubtitleEntries(entries) => {
                if state.translated_lines * 2 < total {
                    let message = messages::aggregate_failure(
                        self.config.ui_language,
                        state.last_error.as_deref().unwrap_or_default(),
                    );
                    signals.signal(&message, SignalKind::Error);
                    error!(
                        "[{}] Only {} of {} lines were translated",
                        self.task_id, state.translated_lines, total
                    );
                    return Err(TranslationError::AggregateFailure {
                        translated: state.translated_lines,
                        total,
                        message,
                        last_error: state.last_error,
                    });
                }

                Ok(TranslationResult::Completed(TranslationOutput::SubtitleEntries(
                    reassemble_entries(&entries, &state.accumulated),
                )))
            }
        }
    }

    /// Drive one batch through attempts, backoff and repair until it is
    /// accepted, the run is cancelled, or retries run out
    async fn process_batch(
        &self,
        index: usize,
        batch: &[String],
        mode: RequestMode,
        state: &mut RunState,
        signals: &dyn SignalSink,
        cancel: &dyn CancelCheck,
    ) -> Result<BatchOutcome, TranslationError> {
        let lang = self.config.ui_language;
        let delay = self.config.inter_attempt_delay();

        loop {
            if cancel.is_cancelled() {
                return Ok(BatchOutcome::Cancelled);
            }

            if state.attempt_count > self.config.max_retries {
                let last_error = state.last_error.clone();
                let message = messages::retries_exhausted(
                    lang,
                    state.attempt_count,
                    last_error.as_deref().unwrap_or_default(),
                );
                signals.signal(&message, SignalKind::Error);
                error!(
                    "[{}] Batch {} failed after {} attempts: {}",
                    self.task_id,
                    index + 1,
                    state.attempt_count,
                    last_error.as_deref().unwrap_or("unknown error")
                );
                return Err(TranslationError::RetriesExhausted {
                    attempts: state.attempt_count,
                    message,
                    last_error,
                });
            }

            if state.begin_attempt() > 1 {
                state.retries += 1;
                signals.signal(
                    &messages::retry_notice(lang, state.attempt_count),
                    SignalKind::ProgressText,
                );
                warn!(
                    "[{}] Retrying batch {} (attempt {}) in {:?}",
                    self.task_id,
                    index + 1,
                    state.attempt_count,
                    self.config.retry_backoff()
                );
                pause(self.config.retry_backoff()).await;

                if cancel.is_cancelled() {
                    return Ok(BatchOutcome::Cancelled);
                }
            }

            debug!(
                "[{}] Batch {} attempt {} ({} lines)",
                self.task_id,
                index + 1,
                state.attempt_count,
                batch.len()
            );

            let accepted = match self.attempt(index, batch, mode, signals).await {
                Ok(translation) => {
                    self.accept(index, mode, translation, state, signals);
                    true
                }
                Err(e) => {
                    error!(
                        "[{}] Batch {} attempt {} failed: {}",
                        self.task_id,
                        index + 1,
                        state.attempt_count,
                        e
                    );
                    state.record_failure(&e);
                    pause(delay).await;
                    false
                }
            };

            pause(delay).await;

            if accepted {
                return Ok(BatchOutcome::Translated);
            }
        }
    }

    /// One backend call for a batch, plus shape repair for subtitle entries
    async fn attempt(
        &self,
        index: usize,
        batch: &[String],
        mode: RequestMode,
        signals: &dyn SignalSink,
    ) -> Result<BatchTranslation, BackendError> {
        let response = self.backend.translate_batch(batch).await?;

        if mode == RequestMode::PlainText {
            return Ok(BatchTranslation {
                lines: vec![response],
                translated: batch.len(),
                repaired: false,
                fell_back: false,
            });
        }

        let expected = batch.len();
        let policy = self.config.shape_policy;
        let mut lines = restore_blank_edges(split_response_lines(&response), batch);
        let mut repaired = false;

        if policy.repair_off_by_one && lines.len() + 1 == expected {
            warn!(
                "[{}] Batch {} returned {} of {} lines, splitting the last line",
                self.task_id,
                index + 1,
                lines.len(),
                expected
            );
            if let Some(split) = repair_off_by_one(&lines, expected) {
                lines = split;
                repaired = true;
            }
        }

        let mut fell_back = false;
        if policy.per_line_fallback && lines.len() < expected {
            warn!(
                "[{}] Batch {} returned {} of {} lines, translating line by line",
                self.task_id,
                index + 1,
                lines.len(),
                expected
            );
            lines = self.translate_line_by_line(batch, signals).await?;
            repaired = false;
            fell_back = true;
        }

        let (lines, translated) = fit_to_batch(lines, expected);
        if translated < expected {
            warn!(
                "[{}] Batch {} is missing {} lines, padding with empty text",
                self.task_id,
                index + 1,
                expected - translated
            );
        }

        Ok(BatchTranslation {
            lines,
            translated,
            repaired,
            fell_back,
        })
    }

    /// Translate every line of a batch with its own backend call
    async fn translate_line_by_line(
        &self,
        batch: &[String],
        signals: &dyn SignalSink,
    ) -> Result<Vec<String>, BackendError> {
        let delay = self.config.inter_attempt_delay();
        let mut lines = Vec::with_capacity(batch.len());

        for line in batch {
            pause(delay).await;
            let source = [line.trim().to_string()];
            let translated = clear_text(&self.backend.translate_batch(&source).await?);
            signals.signal(&format!("{}\n", translated), SignalKind::SubtitleLine);
            lines.push(translated);
        }

        Ok(lines)
    }

    /// Append an accepted batch to the run, reporting each translated line
    fn accept(
        &self,
        index: usize,
        mode: RequestMode,
        translation: BatchTranslation,
        state: &mut RunState,
        signals: &dyn SignalSink,
    ) {
        if mode == RequestMode::SubtitleEntries {
            let first_line = index * self.config.batch_size;
            for (x, line) in translation.lines.iter().take(translation.translated).enumerate() {
                signals.signal(&format!("{}\n", line), SignalKind::SubtitleLine);
                signals.signal(
                    &messages::translating_line(self.config.ui_language, first_line + x + 1),
                    SignalKind::ProgressText,
                );
            }
        }

        if translation.repaired {
            state.repaired_batches += 1;
        }
        if translation.fell_back {
            state.fallback_batches += 1;
        }

        debug!(
            "[{}] Batch {} accepted after {} attempt(s)",
            self.task_id,
            index + 1,
            state.attempt_count
        );
        state.complete_batch(translation.lines, translation.translated);
    }
}
