/*!
 * Response shape repair.
 *
 * Backends do not always return one line per source line. These pure helpers
 * normalize a response, split it into lines and recover the common case of
 * two source lines merged into one.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence-ending punctuation, the preferred place to split a merged line
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?;。！？；…]+\s*").unwrap()
});

/// Clause punctuation, used when no sentence break exists
static CLAUSE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[,，、:：]+\s*").unwrap()
});

/// Plain whitespace, the last resort before a blind midpoint split
static WHITESPACE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").unwrap()
});

/// Normalize raw backend output
pub fn clear_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace('\u{200b}', "")
        .trim()
        .to_string()
}

/// Split a batch response into trimmed lines
///
/// Blank lines inside the response are kept: they answer blank source lines
/// and must hold their position. An empty response has no lines.
pub fn split_response_lines(text: &str) -> Vec<String> {
    let cleaned = clear_text(text);
    if cleaned.is_empty() {
        return Vec::new();
    }

    cleaned.split('\n').map(|line| line.trim().to_string()).collect()
}

/// Put back the empty answers to blank source lines at the edges of a batch
///
/// Trimming a response also removes the blank lines that answer blank source
/// lines at the start or end of the batch. They are restored only when that
/// accounts exactly for the missing lines.
pub fn restore_blank_edges(lines: Vec<String>, batch: &[String]) -> Vec<String> {
    let expected = batch.len();
    if lines.len() >= expected {
        return lines;
    }

    let leading = batch.iter().take_while(|l| l.trim().is_empty()).count();
    if leading == expected {
        return vec![String::new(); expected];
    }
    let trailing = batch.iter().rev().take_while(|l| l.trim().is_empty()).count();
    if lines.len() + leading + trailing != expected {
        return lines;
    }

    let mut restored = vec![String::new(); leading];
    restored.extend(lines);
    restored.resize(expected, String::new());
    restored
}

/// Split one line into two at the break closest to its middle
///
/// Returns None when the line is too short to split.
pub fn split_line_in_two(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let char_count = line.chars().count();
    if char_count < 2 {
        return None;
    }

    let middle = line.len() / 2;
    for pattern in [&*SENTENCE_BREAK, &*CLAUSE_BREAK, &*WHITESPACE_BREAK] {
        let best = pattern
            .find_iter(line)
            .filter(|m| m.end() < line.len())
            .min_by_key(|m| m.end().abs_diff(middle));

        if let Some(m) = best {
            let head = line[..m.end()].trim();
            let tail = line[m.end()..].trim();
            if !head.is_empty() && !tail.is_empty() {
                return Some((head.to_string(), tail.to_string()));
            }
        }
    }

    let (split_at, _) = line.char_indices().nth(char_count / 2)?;
    Some((line[..split_at].to_string(), line[split_at..].to_string()))
}

/// Recover a response that is exactly one line short
///
/// Assumes the backend merged the last two source lines and splits the last
/// returned line in two. Returns None when the counts do not match that case
/// or the last line cannot be split.
pub fn repair_off_by_one(lines: &[String], expected: usize) -> Option<Vec<String>> {
    if lines.len() + 1 != expected {
        return None;
    }

    let (last, rest) = lines.split_last()?;
    let (head, tail) = split_line_in_two(last)?;

    let mut repaired = rest.to_vec();
    repaired.push(head);
    repaired.push(tail);
    Some(repaired)
}

/// Fit translated lines to a batch of `expected` lines
///
/// Extra lines are dropped, missing lines are padded with empty strings.
/// Returns the fitted lines and how many of them came from the backend.
pub fn fit_to_batch(lines: Vec<String>, expected: usize) -> (Vec<String>, usize) {
    let mut fitted: Vec<String> = lines
        .into_iter()
        .take(expected)
        .map(|line| line.trim().to_string())
        .collect();
    let translated = fitted.len();
    fitted.resize(expected, String::new());
    (fitted, translated)
}
