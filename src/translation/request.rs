/*!
 * Translation requests and results.
 *
 * A request is either plain text, split on newlines, or an ordered list of
 * subtitle entries. The variant fixes the shape of the output.
 */

use crate::subtitle_entry::{SubtitleEntry, TextEntry};

/// Input of one translation run
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationRequest<E = SubtitleEntry> {
    /// A single string, translated batch by batch and joined back with newlines
    PlainText(String),
    /// Ordered records whose `text` is translated line by line
    SubtitleEntries(Vec<E>),
}

/// Which shape a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    PlainText,
    SubtitleEntries,
}

/// Output of a completed run, same shape as the request
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutput<E = SubtitleEntry> {
    PlainText(String),
    SubtitleEntries(Vec<E>),
}

/// What `BatchTranslator::run` hands back when it does not fail
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResult<E = SubtitleEntry> {
    /// Every batch was processed
    Completed(TranslationOutput<E>),
    /// The host asked to stop; `partial` holds what had accumulated.
    /// Plain text runs accumulate one unit per batch, entry runs one per line.
    Cancelled { partial: Vec<String> },
}

impl<E> TranslationResult<E> {
    /// True when the run was stopped by the host
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The output of a completed run
    pub fn completed(self) -> Option<TranslationOutput<E>> {
        match self {
            Self::Completed(output) => Some(output),
            Self::Cancelled { .. } => None,
        }
    }
}

impl<E: TextEntry> TranslationRequest<E> {
    /// Shape of this request
    pub fn mode(&self) -> RequestMode {
        match self {
            Self::PlainText(_) => RequestMode::PlainText,
            Self::SubtitleEntries(_) => RequestMode::SubtitleEntries,
        }
    }

    /// The ordered source lines
    ///
    /// Plain text is trimmed and split on newlines; blank text yields no lines.
    pub fn source_lines(&self) -> Vec<String> {
        match self {
            Self::PlainText(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Vec::new();
                }
                text.split('\n')
                    .map(|line| line.trim_end_matches('\r').to_string())
                    .collect()
            }
            Self::SubtitleEntries(entries) => entries.iter().map(|e| e.text().to_string()).collect(),
        }
    }
}

/// Partition lines into consecutive batches of at most `batch_size` lines
pub fn split_into_batches(lines: &[String], batch_size: usize) -> Vec<Vec<String>> {
    lines
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Write translated lines back into the original entries
///
/// Entry `i` receives `translated[i]`, or an empty string when fewer lines
/// were translated than there are entries.
pub fn reassemble_entries<E: TextEntry + Clone>(entries: &[E], translated: &[String]) -> Vec<E> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut entry = entry.clone();
            entry.set_text(translated.get(i).cloned().unwrap_or_default());
            entry
        })
        .collect()
}
