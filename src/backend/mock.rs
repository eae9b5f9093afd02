/*!
 * Mock backend for testing.
 *
 * This module provides a backend that simulates the misbehaviors real
 * translation services show:
 * - `MockBackend::working()` - One translated line per input line
 * - `MockBackend::merge_last_two()` - Joins the last two lines of a batch
 * - `MockBackend::dropping(keep)` - Returns only the first lines of a batch
 * - `MockBackend::failing()` - Always fails
 * - `MockBackend::fail_first(n)` - Fails n times, then works
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::BackendError;

use super::TranslationBackend;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one line per input line
    Working,
    /// Multi-line batches come back with the last two lines joined by a space
    MergeLastTwo,
    /// Multi-line batches come back with only the first `keep` lines
    DropLines { keep: usize },
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Fails the first `failures` requests, then works
    FailFirst { failures: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
}

/// Mock backend recording every call it receives
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Prefix marking translated text
    target_label: String,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every batch received, in call order
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            target_label: "fr".to_string(),
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock backend
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that merges the last two lines of every batch
    pub fn merge_last_two() -> Self {
        Self::new(MockBehavior::MergeLastTwo)
    }

    /// Create a mock that under-delivers lines for multi-line batches
    pub fn dropping(keep: usize) -> Self {
        Self::new(MockBehavior::DropLines { keep })
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a mock that fails a fixed number of times before working
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set the label used to mark translated lines
    pub fn with_target_label(mut self, label: &str) -> Self {
        self.target_label = label.to_string();
        self
    }

    /// The translation this mock gives for a single line
    pub fn translate_line(&self, line: &str) -> String {
        format!("[{}] {}", self.target_label, line.trim())
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared call counter, usable from cancellation checks
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.request_count)
    }

    /// Every batch received so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    fn translate_all(&self, lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| self.translate_line(line)).collect()
    }
}

impl Clone for MockBackend {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            target_label: self.target_label.clone(),
            request_count: Arc::clone(&self.request_count),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate_batch(&self, lines: &[String]) -> Result<String, BackendError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(lines.to_vec());

        match self.behavior {
            MockBehavior::Working => Ok(self.translate_all(lines).join("\n")),

            MockBehavior::MergeLastTwo => {
                let mut translated = self.translate_all(lines);
                if translated.len() >= 2 {
                    let last = translated.pop().unwrap_or_default();
                    if let Some(previous) = translated.last_mut() {
                        previous.push(' ');
                        previous.push_str(&last);
                    }
                }
                Ok(translated.join("\n"))
            }

            MockBehavior::DropLines { keep } => {
                let mut translated = self.translate_all(lines);
                if translated.len() > 1 {
                    translated.truncate(keep);
                }
                Ok(translated.join("\n"))
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(BackendError::ApiError {
                        status_code: 500,
                        message: format!("Simulated intermittent failure (request {})", count + 1),
                    })
                } else {
                    Ok(self.translate_all(lines).join("\n"))
                }
            }

            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(BackendError::ConnectionError(format!(
                        "Simulated connection failure (request {})",
                        count + 1
                    )))
                } else {
                    Ok(self.translate_all(lines).join("\n"))
                }
            }

            MockBehavior::Failing => Err(BackendError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),

            MockBehavior::Empty => Ok(String::new()),
        }
    }
}
