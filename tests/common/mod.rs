/*!
 * Common test utilities for the batchtrans test suite
 */

use batchtrans::app_config::TranslatorConfig;
use batchtrans::subtitle_entry::SubtitleEntry;

/// Route library logs to the test output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration with no pauses, so runs finish instantly
pub fn fast_config(batch_size: usize) -> TranslatorConfig {
    TranslatorConfig {
        batch_size,
        inter_attempt_delay_secs: 0.0,
        retry_backoff_secs: 0.0,
        target_language: "fr".to_string(),
        ..TranslatorConfig::default()
    }
    .with_task_id("test-task")
}

/// Subtitle entries "Subtitle 1" .. "Subtitle n", two seconds apart
pub fn sample_entries(count: usize) -> Vec<SubtitleEntry> {
    (1..=count)
        .map(|i| {
            let start = (i as u64 - 1) * 2_000;
            SubtitleEntry::new(i, start, start + 1_500, format!("Subtitle {}", i))
        })
        .collect()
}

/// Entries built from the given texts
pub fn entries_from(texts: &[&str]) -> Vec<SubtitleEntry> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| SubtitleEntry::new(i + 1, i as u64 * 1_000, i as u64 * 1_000 + 900, text.to_string()))
        .collect()
}

/// The text `MockBackend::working()` produces for a line
pub fn mock_translation(line: &str) -> String {
    format!("[fr] {}", line)
}
