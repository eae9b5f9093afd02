/*!
 * Progress signaling and cooperative cancellation.
 *
 * The batch translator reports to its host through a `SignalSink` and polls a
 * `CancelCheck` before every attempt. Closures implement both traits.
 */

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Kind of message sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Status text such as "Translating 12" or a retry notice
    ProgressText,
    /// One translated line, newline-terminated
    SubtitleLine,
    /// A fatal error about to be returned
    Error,
}

impl SignalKind {
    /// Wire name used by hosts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgressText => "logs",
            Self::SubtitleLine => "subtitle",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receiver of progress and error messages
///
/// Must not block and must not fail; delivery problems are the sink's concern.
pub trait SignalSink: Send + Sync {
    fn signal(&self, text: &str, kind: SignalKind);
}

impl<F> SignalSink for F
where
    F: Fn(&str, SignalKind) + Send + Sync,
{
    fn signal(&self, text: &str, kind: SignalKind) {
        self(text, kind)
    }
}

/// Sink that drops every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn signal(&self, _text: &str, _kind: SignalKind) {}
}

/// A captured message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub text: String,
}

/// Sink that keeps every message, for hosts that inspect them afterwards
#[derive(Debug, Default, Clone)]
pub struct SignalLog {
    entries: Arc<Mutex<Vec<Signal>>>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message received so far
    pub fn signals(&self) -> Vec<Signal> {
        self.entries.lock().clone()
    }

    /// Texts of the messages of one kind, in order
    pub fn texts(&self, kind: SignalKind) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.text.clone())
            .collect()
    }
}

impl SignalSink for SignalLog {
    fn signal(&self, text: &str, kind: SignalKind) {
        self.entries.lock().push(Signal {
            kind,
            text: text.to_string(),
        });
    }
}

/// Sink rendering a run on a terminal progress bar
///
/// Translated lines advance the bar, progress text becomes its message and
/// an error abandons it.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    /// Create a bar for a run of `total_lines` lines
    pub fn new(total_lines: u64) -> Self {
        let bar = ProgressBar::new(total_lines);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░"));
        }
        Self { bar }
    }

    /// Wrap an existing bar, e.g. one owned by a `MultiProgress`
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    /// The underlying bar
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl SignalSink for ProgressBarSink {
    fn signal(&self, text: &str, kind: SignalKind) {
        match kind {
            SignalKind::ProgressText => self.bar.set_message(text.trim().to_string()),
            SignalKind::SubtitleLine => self.bar.inc(1),
            SignalKind::Error => self.bar.abandon_with_message(text.trim().to_string()),
        }
    }
}

/// Cooperative cancellation flag owned by the host
///
/// Polled once per attempt; must be cheap and side-effect free.
pub trait CancelCheck: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl<F> CancelCheck for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

impl CancelCheck for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl CancelCheck for Arc<AtomicBool> {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Cancellation check for runs that cannot be stopped
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancel;

impl CancelCheck for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}
