use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// @module: Subtitle records handed to the batch translator

/// A record carrying translatable text
///
/// Everything apart from the text is opaque to the translator and must come
/// back unchanged. Implement this for host-specific record types to translate
/// them without conversion.
pub trait TextEntry {
    /// Text to translate
    fn text(&self) -> &str;

    /// Replace the text with its translation
    fn set_text(&mut self, text: String);
}

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    // @field: Sequence number
    #[serde(default)]
    pub seq_num: usize,

    // @field: Start time in ms
    #[serde(default)]
    pub start_time_ms: u64,

    // @field: End time in ms
    #[serde(default)]
    pub end_time_ms: u64,

    // @field: Subtitle text
    pub text: String,

    // @field: Host fields passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
            extra: Map::new(),
        }
    }

    /// Attach an opaque host field
    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl TextEntry for SubtitleEntry {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}
