/*!
 * End-to-end batch translation runs against mock backends
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use batchtrans::backend::FnBackend;
use batchtrans::backend::mock::MockBackend;
use batchtrans::errors::{BackendError, TranslationError};
use batchtrans::subtitle_entry::{SubtitleEntry, TextEntry};
use batchtrans::translation::{
    BatchTranslator, NeverCancel, NullSink, SignalKind, SignalLog, TranslationOutput,
    TranslationRequest, TranslationResult,
};
use serde_json::json;

use crate::common::{entries_from, fast_config, init_logging, mock_translation, sample_entries};

fn expect_entries(result: TranslationResult) -> Vec<SubtitleEntry> {
    match result {
        TranslationResult::Completed(TranslationOutput::SubtitleEntries(entries)) => entries,
        other => panic!("Expected translated entries, got {:?}", other),
    }
}

fn texts(entries: &[SubtitleEntry]) -> Vec<String> {
    entries.iter().map(|e| e.text.clone()).collect()
}

/// Plain text comes back with one line per source line
#[tokio::test]
async fn test_run_withPlainText_shouldPreserveLineCount() -> Result<()> {
    init_logging();
    let backend = MockBackend::working();
    let translator = BatchTranslator::new(fast_config(3), backend.clone())?;
    let source: Vec<String> = (1..=7).map(|i| format!("line {}", i)).collect();

    let result = translator
        .run(
            TranslationRequest::<SubtitleEntry>::PlainText(source.join("\n")),
            &NullSink,
            &NeverCancel,
        )
        .await?;

    let expected: Vec<String> = source.iter().map(|l| mock_translation(l)).collect();
    match result {
        TranslationResult::Completed(TranslationOutput::PlainText(text)) => {
            assert_eq!(text.lines().count(), 7);
            assert_eq!(text, expected.join("\n"));
        }
        other => panic!("Expected plain text, got {:?}", other),
    }
    assert_eq!(backend.call_count(), 3);
    Ok(())
}

/// Blank plain text and empty entry lists never reach the backend
#[tokio::test]
async fn test_run_withEmptyInput_shouldReturnEmptyOutput() -> Result<()> {
    let backend = MockBackend::working();
    let translator = BatchTranslator::new(fast_config(5), backend.clone())?;

    let plain = translator
        .run(TranslationRequest::<SubtitleEntry>::PlainText("  \n".to_string()), &NullSink, &NeverCancel)
        .await?;
    assert_eq!(plain, TranslationResult::Completed(TranslationOutput::PlainText(String::new())));

    let entries = translator
        .run(TranslationRequest::SubtitleEntries(Vec::new()), &NullSink, &NeverCancel)
        .await?;
    assert!(expect_entries(entries).is_empty());
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

/// Entries keep their count, timing and host fields; only text changes
#[tokio::test]
async fn test_run_withEntries_shouldOverwriteTextOnly() -> Result<()> {
    let backend = MockBackend::working();
    let translator = BatchTranslator::new(fast_config(3), backend.clone())?;
    let mut source = sample_entries(7);
    source[4] = source[4].clone().with_extra("speaker", json!("Alice"));

    let result = translator
        .run(TranslationRequest::SubtitleEntries(source.clone()), &NullSink, &NeverCancel)
        .await?;
    let output = expect_entries(result);

    assert_eq!(output.len(), 7);
    for (original, translated) in source.iter().zip(&output) {
        assert_eq!(translated.text, mock_translation(&original.text));
        assert_eq!(translated.seq_num, original.seq_num);
        assert_eq!(translated.start_time_ms, original.start_time_ms);
        assert_eq!(translated.end_time_ms, original.end_time_ms);
        assert_eq!(translated.extra, original.extra);
    }
    assert_eq!(backend.call_count(), 3);
    Ok(())
}

/// A batch of three answered with two lines is split back into three
#[tokio::test]
async fn test_run_withMergedLastLine_shouldRepairWithoutExtraCalls() -> Result<()> {
    let backend = MockBackend::merge_last_two();
    let translator = BatchTranslator::new(fast_config(3), backend.clone())?;
    let source = entries_from(&[
        "First line.",
        "Second line.",
        "Third line.",
        "Fourth line.",
        "Fifth line.",
        "Sixth line.",
    ]);

    let result = translator
        .run(TranslationRequest::SubtitleEntries(source.clone()), &NullSink, &NeverCancel)
        .await?;
    let output = expect_entries(result);

    let expected: Vec<String> = source.iter().map(|e| mock_translation(&e.text)).collect();
    assert_eq!(texts(&output), expected);
    assert_eq!(backend.call_count(), 2);
    Ok(())
}

/// A batch answered with too few lines is retranslated one line per call
#[tokio::test]
async fn test_run_withUnderCount_shouldFallBackToPerLineCalls() -> Result<()> {
    let backend = MockBackend::dropping(1);
    let translator = BatchTranslator::new(fast_config(3), backend.clone())?;
    let source = entries_from(&["A", "B", "C"]);
    let signals = SignalLog::new();

    let result = translator
        .run(TranslationRequest::SubtitleEntries(source), &signals, &NeverCancel)
        .await?;
    let output = expect_entries(result);

    assert_eq!(texts(&output), vec!["[fr] A", "[fr] B", "[fr] C"]);
    assert_eq!(
        backend.calls(),
        vec![
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["A".to_string()],
            vec!["B".to_string()],
            vec!["C".to_string()],
        ]
    );
    // Fallback lines are reported as they arrive, then again when appended
    assert_eq!(signals.texts(SignalKind::SubtitleLine).len(), 6);
    Ok(())
}

/// Without the per-line fallback, missing lines are padded and the run
/// still succeeds while at least half the lines were translated
#[tokio::test]
async fn test_run_withoutFallback_shouldPadMissingLines() -> Result<()> {
    let mut config = fast_config(5);
    config.shape_policy.per_line_fallback = false;
    let translator = BatchTranslator::new(config, MockBackend::dropping(3))?;

    let result = translator
        .run(TranslationRequest::SubtitleEntries(sample_entries(10)), &NullSink, &NeverCancel)
        .await?;
    let output = expect_entries(result);

    assert_eq!(output.len(), 10);
    assert_eq!(output[0].text, "[fr] Subtitle 1");
    assert_eq!(output[2].text, "[fr] Subtitle 3");
    assert_eq!(output[3].text, "");
    assert_eq!(output[4].text, "");
    assert_eq!(output[7].text, "[fr] Subtitle 8");
    assert_eq!(output[9].text, "");
    Ok(())
}

/// Fewer than half of the lines translated fails the whole run
#[tokio::test]
async fn test_run_withMostLinesMissing_shouldFailAggregateThreshold() -> Result<()> {
    let mut config = fast_config(5);
    config.shape_policy.per_line_fallback = false;
    let translator = BatchTranslator::new(config, MockBackend::dropping(1))?;
    let signals = SignalLog::new();

    let error = translator
        .run(TranslationRequest::SubtitleEntries(sample_entries(10)), &signals, &NeverCancel)
        .await
        .unwrap_err();

    match &error {
        TranslationError::AggregateFailure { translated, total, .. } => {
            assert_eq!(*translated, 2);
            assert_eq!(*total, 10);
        }
        other => panic!("Expected aggregate failure, got {:?}", other),
    }
    assert_eq!(signals.texts(SignalKind::Error), vec![error.to_string()]);
    Ok(())
}

/// Backend output is normalized before lines are counted
#[tokio::test]
async fn test_run_withNoisyResponse_shouldNormalizeLines() -> Result<()> {
    let backend = FnBackend::new(|lines: &[String]| {
        Ok(lines
            .iter()
            .map(|l| format!("{}&#39;s\r\n", l))
            .collect::<Vec<_>>()
            .concat())
    });
    let translator = BatchTranslator::new(fast_config(2), backend)?;

    let result = translator
        .run(TranslationRequest::SubtitleEntries(entries_from(&["It", "That"])), &NullSink, &NeverCancel)
        .await?;

    assert_eq!(texts(&expect_entries(result)), vec!["It's", "That's"]);
    Ok(())
}

/// Translate each line as `T:<line>`, leaving blank lines blank
fn tag_line(line: &str) -> String {
    if line.trim().is_empty() {
        String::new()
    } else {
        format!("T:{}", line)
    }
}

/// A blank entry inside a batch keeps its slot in a one-line-per-input reply
#[tokio::test]
async fn test_run_withBlankEntryInBatch_shouldKeepLinesAligned() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let backend = FnBackend::new(move |lines: &[String]| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(lines.iter().map(|l| tag_line(l)).collect::<Vec<_>>().join("\n"))
    });
    let translator = BatchTranslator::new(fast_config(3), backend)?;

    let result = translator
        .run(
            TranslationRequest::SubtitleEntries(entries_from(&["Hello.", "", "World. Again."])),
            &NullSink,
            &NeverCancel,
        )
        .await?;

    assert_eq!(texts(&expect_entries(result)), vec!["T:Hello.", "", "T:World. Again."]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Blank entries at the start or end of a batch survive the trimmed reply
#[tokio::test]
async fn test_run_withBlankEntriesAtBatchEdges_shouldKeepLinesAligned() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let backend = FnBackend::new(move |lines: &[String]| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(lines.iter().map(|l| tag_line(l)).collect::<Vec<_>>().join("\n"))
    });
    let translator = BatchTranslator::new(fast_config(3), backend)?;

    let result = translator
        .run(
            TranslationRequest::SubtitleEntries(entries_from(&["", "A b", "C d", "E f", ""])),
            &NullSink,
            &NeverCancel,
        )
        .await?;

    assert_eq!(texts(&expect_entries(result)), vec!["", "T:A b", "T:C d", "T:E f", ""]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

/// A failed single-line call during the fallback retries the whole batch
#[tokio::test]
async fn test_run_withFailureDuringLineFallback_shouldRetryBatch() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let failed_once = AtomicBool::new(false);
    let counter = Arc::clone(&calls);
    let backend = FnBackend::new(move |lines: &[String]| {
        counter.fetch_add(1, Ordering::SeqCst);
        if lines.len() > 1 {
            // Only the first line comes back, too short for the merge repair
            return Ok(tag_line(&lines[0]));
        }
        if !failed_once.swap(true, Ordering::SeqCst) {
            return Err(BackendError::ConnectionError("line call dropped".to_string()));
        }
        Ok(tag_line(&lines[0]))
    });
    let mut config = fast_config(3);
    config.max_retries = 1;
    let translator = BatchTranslator::new(config, backend)?;
    let signals = SignalLog::new();

    let result = translator
        .run(TranslationRequest::SubtitleEntries(entries_from(&["A", "B", "C"])), &signals, &NeverCancel)
        .await?;

    assert_eq!(texts(&expect_entries(result)), vec!["T:A", "T:B", "T:C"]);
    // Batch call and failed line call, then batch call and three line calls
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert!(signals.texts(SignalKind::ProgressText).contains(&"2 retries after error".to_string()));
    assert!(signals.texts(SignalKind::Error).is_empty());
    Ok(())
}

/// Host record types only need `TextEntry`
#[derive(Debug, Clone, PartialEq)]
struct HostLine {
    id: u32,
    body: String,
}

impl TextEntry for HostLine {
    fn text(&self) -> &str {
        &self.body
    }

    fn set_text(&mut self, text: String) {
        self.body = text;
    }
}

#[tokio::test]
async fn test_run_withCustomEntryType_shouldPassFieldsThrough() -> Result<()> {
    let translator = BatchTranslator::new(fast_config(2), MockBackend::working())?;
    let source = vec![
        HostLine { id: 10, body: "one".to_string() },
        HostLine { id: 20, body: "two".to_string() },
        HostLine { id: 30, body: "three".to_string() },
    ];

    let result = translator
        .run(TranslationRequest::SubtitleEntries(source), &NullSink, &NeverCancel)
        .await?;

    let expected = vec![
        HostLine { id: 10, body: "[fr] one".to_string() },
        HostLine { id: 20, body: "[fr] two".to_string() },
        HostLine { id: 30, body: "[fr] three".to_string() },
    ];
    assert_eq!(result, TranslationResult::Completed(TranslationOutput::SubtitleEntries(expected)));
    Ok(())
}

/// Runs on a shared translator keep separate state
#[tokio::test]
async fn test_run_concurrentlyOnSharedTranslator_shouldNotMixResults() -> Result<()> {
    let translator = Arc::new(BatchTranslator::new(fast_config(2), MockBackend::working())?);

    let first = {
        let translator = Arc::clone(&translator);
        tokio::spawn(async move {
            translator
                .run(TranslationRequest::SubtitleEntries(entries_from(&["a", "b", "c"])), &NullSink, &NeverCancel)
                .await
        })
    };
    let second = {
        let translator = Arc::clone(&translator);
        tokio::spawn(async move {
            translator
                .run(TranslationRequest::SubtitleEntries(entries_from(&["x", "y"])), &NullSink, &NeverCancel)
                .await
        })
    };

    let first = expect_entries(first.await??);
    let second = expect_entries(second.await??);
    assert_eq!(texts(&first), vec!["[fr] a", "[fr] b", "[fr] c"]);
    assert_eq!(texts(&second), vec!["[fr] x", "[fr] y"]);
    Ok(())
}

/// A synchronous host can drive a run with a blocking executor
#[test]
fn test_run_withBlockingExecutor_shouldComplete() {
    let translator = BatchTranslator::new(
        fast_config(5),
        FnBackend::new(|lines: &[String]| {
            if lines.is_empty() {
                Err(BackendError::ParseError("empty batch".to_string()))
            } else {
                Ok(lines.join("\n").to_uppercase())
            }
        }),
    )
    .unwrap();

    let result = tokio_test::block_on(translator.run(
        TranslationRequest::<SubtitleEntry>::PlainText("hello\nworld".to_string()),
        &NullSink,
        &NeverCancel,
    ))
    .unwrap();

    assert_eq!(result, TranslationResult::Completed(TranslationOutput::PlainText("HELLO\nWORLD".to_string())));
}
