//! Script-based language detection.
//!
//! Classifies raw text into a language label by testing an ordered list of
//! Unicode-block patterns. The detector is advisory: a structured model
//! response may later override it with its own self-reported language.

use regex::Regex;
use std::sync::LazyLock;

/// Label returned for empty input and Latin-script text.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Catch-all label for non-empty text matching no known script.
pub const REGIONAL_FALLBACK: &str = "Regional Indian";

/// Ordered script patterns; the first pattern matching any character wins.
/// Latin is checked first so mixed Latin/Indic text classifies as English.
static SCRIPT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let mk = |pat: &str| Regex::new(pat).expect("Invalid script regex");
    vec![
        (mk(r"[a-zA-Z]"), "English"),
        (mk(r"[\u{0900}-\u{097F}]"), "Hindi"),
        (mk(r"[\u{0B80}-\u{0BFF}]"), "Tamil"),
        (mk(r"[\u{0C00}-\u{0C7F}]"), "Telugu"),
        (mk(r"[\u{0C80}-\u{0CFF}]"), "Gujarati"),
        (mk(r"[\u{0980}-\u{09FF}]"), "Bengali"),
    ]
});

/// Detect the language of `text` from its script.
///
/// Returns `"English"` for empty text, the first matching script label
/// otherwise, and `"Regional Indian"` when no pattern matches.
pub fn detect_language(text: &str) -> &'static str {
    if text.is_empty() {
        return DEFAULT_LANGUAGE;
    }

    for (pattern, label) in SCRIPT_PATTERNS.iter() {
        if pattern.is_match(text) {
            return *label;
        }
    }

    REGIONAL_FALLBACK
}
