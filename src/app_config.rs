use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::language_utils;

/// Translator configuration module
/// This module holds the immutable settings of one translation run and the
/// ways of building them: serde deserialization of a JSON settings document,
/// or a read-only key lookup against the host application's settings store.
/// Settings key for the number of lines per backend request
pub const KEY_BATCH_SIZE: &str = "trans_thread";
/// Settings key for the per-batch retry ceiling
pub const KEY_MAX_RETRIES: &str = "retries";
/// Settings key for the pause after every attempt, in seconds
pub const KEY_INTER_ATTEMPT_DELAY: &str = "translation_wait";
/// Settings key for the pause before a retry, in seconds
pub const KEY_RETRY_BACKOFF: &str = "retry_backoff";
/// Settings key for the target language
pub const KEY_TARGET_LANGUAGE: &str = "target_language";
/// Settings key for the source language code
pub const KEY_SOURCE_CODE: &str = "source_code";
/// Settings key for the language of host-facing messages
pub const KEY_UI_LANGUAGE: &str = "defaulelang";

/// Language used for messages shown to the host
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiLanguage {
    #[default]
    En,
    Zh,
}

impl FromStr for UiLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            _ => Err(anyhow!("Invalid UI language: {}", s)),
        }
    }
}

/// How a batch response with the wrong number of lines is recovered
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ShapePolicy {
    /// Split the last returned line when the response is exactly one line short
    #[serde(default = "default_true")]
    pub repair_off_by_one: bool,

    /// Translate line by line when the response is still short after repair
    #[serde(default = "default_true")]
    pub per_line_fallback: bool,
}

impl Default for ShapePolicy {
    fn default() -> Self {
        Self {
            repair_off_by_one: true,
            per_line_fallback: true,
        }
    }
}

/// Immutable configuration of one translation run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslatorConfig {
    /// Lines per backend request
    #[serde(rename = "trans_thread", default = "default_batch_size")]
    pub batch_size: usize,

    /// Retries allowed per batch after the first attempt
    #[serde(rename = "retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause after every attempt, success or failure (seconds)
    #[serde(rename = "translation_wait", default = "default_inter_attempt_delay_secs")]
    pub inter_attempt_delay_secs: f64,

    /// Pause before a retry is attempted (seconds)
    #[serde(rename = "retry_backoff", default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: f64,

    /// Target language, as a code or a display name
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Source language code (ISO); empty or "auto" lets the backend detect it
    #[serde(rename = "source_code", default)]
    pub source_language_code: String,

    /// Language of retry notices and error messages
    #[serde(rename = "defaulelang", default)]
    pub ui_language: UiLanguage,

    /// Line-count mismatch recovery
    #[serde(default)]
    pub shape_policy: ShapePolicy,

    /// Identifier of the host task this run belongs to
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Read-only key lookup into the host application's settings store
pub trait SettingsSource {
    /// Raw value for a key, or None when the key is absent
    fn get_setting(&self, key: &str) -> Option<String>;
}

impl SettingsSource for HashMap<String, String> {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl SettingsSource for serde_json::Map<String, Value> {
    fn get_setting(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Parse a setting if present, falling back to the default when absent
fn lookup<T>(settings: &impl SettingsSource, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match settings.get_setting(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value '{}' for setting '{}': {}", raw, key, e)),
        None => Ok(default),
    }
}

fn default_batch_size() -> usize {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_inter_attempt_delay_secs() -> f64 {
    0.1
}

fn default_retry_backoff_secs() -> f64 {
    10.0
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            inter_attempt_delay_secs: default_inter_attempt_delay_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
            target_language: default_target_language(),
            source_language_code: String::new(),
            ui_language: UiLanguage::default(),
            shape_policy: ShapePolicy::default(),
            task_id: None,
        }
    }
}

impl TranslatorConfig {
    /// Build a configuration from the host settings store
    pub fn from_settings(settings: &impl SettingsSource) -> Result<Self> {
        let config = Self {
            batch_size: lookup(settings, KEY_BATCH_SIZE, default_batch_size())?,
            max_retries: lookup(settings, KEY_MAX_RETRIES, default_max_retries())?,
            inter_attempt_delay_secs: lookup(
                settings,
                KEY_INTER_ATTEMPT_DELAY,
                default_inter_attempt_delay_secs(),
            )?,
            retry_backoff_secs: lookup(settings, KEY_RETRY_BACKOFF, default_retry_backoff_secs())?,
            target_language: settings
                .get_setting(KEY_TARGET_LANGUAGE)
                .unwrap_or_else(default_target_language),
            source_language_code: settings.get_setting(KEY_SOURCE_CODE).unwrap_or_default(),
            ui_language: lookup(settings, KEY_UI_LANGUAGE, UiLanguage::default())?,
            shape_policy: ShapePolicy::default(),
            task_id: None,
        };

        Ok(config)
    }

    /// Load a configuration from a JSON settings file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open settings file: {:?}", path))?;

        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow!("Batch size ({}) must be at least 1", KEY_BATCH_SIZE));
        }

        for (key, secs) in [
            (KEY_INTER_ATTEMPT_DELAY, self.inter_attempt_delay_secs),
            (KEY_RETRY_BACKOFF, self.retry_backoff_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(anyhow!("Delay '{}' must be a non-negative number of seconds, got {}", key, secs));
            }
        }

        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language is required"));
        }

        language_utils::validate_source_code(&self.source_language_code)
            .context("Invalid source language code")?;

        Ok(())
    }

    /// Builder-style override of the task identifier
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Pause after every attempt
    pub fn inter_attempt_delay(&self) -> Duration {
        Duration::from_secs_f64(self.inter_attempt_delay_secs.max(0.0))
    }

    /// Pause before a retry
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs_f64(self.retry_backoff_secs.max(0.0))
    }
}
