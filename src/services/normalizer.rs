//! Text normalizer.
//!
//! Cleans raw extracted document text into a canonical line-oriented form
//! so the line-based structural parser stays tractable. Text pasted from
//! PDFs/Word often carries zero-width characters, CR line endings and whole
//! numbered lists concatenated onto one physical line; this pass undoes all
//! of that. Pure, never fails, idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

/// Zero-width and BOM-like characters stripped outright.
const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// A question-start token appearing mid-line, e.g. `... text 12. Next question`.
static INLINE_QUESTION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\n])[ \t]+((?:Câu|Question)[ \t]*\d{1,3}[:.)]|\d{1,3}[.)][ \t])").unwrap()
});

/// An answer-option token appearing mid-line, e.g. `... 4 B. 5 C. 6`.
static INLINE_ANSWER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\n])[ \t]+([*✓✔☑√]?[ \t]*\(?[A-Ha-h][.)][ \t])").unwrap()
});

/// Runs of spaces/tabs inside a line.
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Two or more consecutive blank lines.
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// Canonicalize raw document text.
///
/// Steps, in order: line-ending unification, zero-width strip,
/// dash/ellipsis unification, pre-segmentation line breaks before inline
/// question/answer tokens, per-line whitespace collapse, blank-line-run
/// collapse. Empty input returns an empty string.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");

    text.retain(|c| !ZERO_WIDTH.contains(&c));

    text = text
        .replace(['\u{2014}', '\u{2013}', '\u{2015}'], "-")
        .replace('\u{2026}', "...");

    // Pre-segmentation: structurally distinct items must begin their own
    // line even when the source concatenated them.
    text = INLINE_QUESTION_TOKEN.replace_all(&text, "$1\n$2").to_string();
    text = INLINE_ANSWER_TOKEN.replace_all(&text, "$1\n$2").to_string();

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| SPACE_RUN.replace_all(line.trim(), " ").to_string())
        .collect();
    text = lines.join("\n");

    text = BLANK_RUN.replace_all(&text, "\n\n").to_string();

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\n  "), "");
    }

    #[test]
    fn unifies_line_endings_and_blank_runs() {
        let out = normalize("first\r\nsecond\r\r\n\n\nthird");
        assert_eq!(out, "first\nsecond\n\nthird");
    }

    #[test]
    fn strips_zero_width_characters() {
        assert_eq!(normalize("a\u{200B}b\u{FEFF}c"), "abc");
    }

    #[test]
    fn normalizes_dash_and_ellipsis_variants() {
        assert_eq!(normalize("range 1\u{2013}5 \u{2026}"), "range 1-5 ...");
    }

    #[test]
    fn breaks_concatenated_numbered_items_apart() {
        // A numbered list pasted from a PDF onto one physical line.
        let out = normalize("1. What is 2+2? A. 3 B. 4 2. Capital of France? A. Paris B. Lyon");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1. What is 2+2?",
                "A. 3",
                "B. 4",
                "2. Capital of France?",
                "A. Paris",
                "B. Lyon",
            ]
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "",
            "plain prose with no structure at all",
            "1. What is 2+2? A. 3 *B. 4 C. 5",
            "Câu 1: Thủ đô của Việt Nam?\u{200B} A. Hà Nội B. Huế",
            "x\r\n\r\n\r\ny \u{2014} z\u{2026}",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
