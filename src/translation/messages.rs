/*!
 * Host-facing messages, localized by `UiLanguage`.
 */

use crate::app_config::UiLanguage;

/// Notice sent before a failed batch is attempted again
pub fn retry_notice(lang: UiLanguage, attempt: u32) -> String {
    match lang {
        UiLanguage::Zh => format!("第{}次出错重试", attempt),
        UiLanguage::En => format!("{} retries after error", attempt),
    }
}

/// A batch kept failing after every allowed retry
pub fn retries_exhausted(lang: UiLanguage, attempts: u32, last_error: &str) -> String {
    match lang {
        UiLanguage::Zh => format!("{}次重试后依然出错,{}", attempts, last_error),
        UiLanguage::En => format!("{} retries after error persists, {}", attempts, last_error),
    }
}

/// Too few lines were translated across the whole run
pub fn aggregate_failure(lang: UiLanguage, last_error: &str) -> String {
    match lang {
        UiLanguage::Zh => format!("翻译出错数量超过一半，请检查:{}", last_error),
        UiLanguage::En => format!(
            "More than half of the subtitles failed to translate, please check: {}",
            last_error
        ),
    }
}

/// Progress text after a line has been translated (1-based global index)
pub fn translating_line(lang: UiLanguage, line_number: usize) -> String {
    match lang {
        UiLanguage::Zh => format!("开始翻译 {}", line_number),
        UiLanguage::En => format!("Translating {}", line_number),
    }
}
