use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Source languages are given as ISO 639-1 (2-letter) or ISO 639-2
/// (3-letter) codes. An empty code or `auto` means "let the backend detect".
/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Returns true when the code asks the backend to detect the source language
pub fn is_auto_detect(code: &str) -> bool {
    let code = code.trim();
    code.is_empty() || code.eq_ignore_ascii_case("auto")
}

/// Resolve an ISO 639-1 or ISO 639-2 (T or B) code to a language
fn lookup(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == code)
                .map_or(code.as_str(), |(_, t)| t);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate a source language code
pub fn validate_source_code(code: &str) -> Result<()> {
    if is_auto_detect(code) || lookup(code).is_some() {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}

/// English display name for a language code, or the code itself when unknown
pub fn display_name(code: &str) -> String {
    if is_auto_detect(code) {
        return "auto".to_string();
    }
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| code.trim().to_string())
}
