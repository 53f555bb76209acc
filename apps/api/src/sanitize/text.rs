//! Free-text sanitizer applied to every submitted field before validation.
//!
//! Order matters: normalization first so compatibility forms (fullwidth
//! letters, ligatures) collapse to their plain equivalents before the
//! allow-list filter runs, truncation after filtering so the bound applies
//! to what is actually kept.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Punctuation kept by the sanitizer in addition to alphanumerics and space.
pub const SAFE_PUNCTUATION: &str = ".,:;!?'\"()[]{}@#$%^&*-_+=/\\|~";

/// Zero-width and bidirectional-control code point ranges (inclusive).
const INVISIBLE_RANGES: &[(char, char)] = &[
    ('\u{061C}', '\u{061C}'), // arabic letter mark
    ('\u{180E}', '\u{180E}'), // mongolian vowel separator
    ('\u{200B}', '\u{200F}'), // zero-width space .. right-to-left mark
    ('\u{202A}', '\u{202E}'), // embeddings and overrides
    ('\u{2060}', '\u{2064}'), // word joiner .. invisible plus
    ('\u{2066}', '\u{2069}'), // isolates
    ('\u{FEFF}', '\u{FEFF}'), // byte order mark
];

/// Returns true for code points that render as nothing but can reorder or
/// hide surrounding text.
pub fn is_invisible(c: char) -> bool {
    INVISIBLE_RANGES
        .iter()
        .any(|(lo, hi)| (*lo..=*hi).contains(&c))
}

/// Returns true for characters the sanitizer keeps.
pub fn is_safe_char(c: char) -> bool {
    c == ' ' || c.is_alphanumeric() || SAFE_PUNCTUATION.contains(c)
}

fn markup_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static tag pattern compiles"))
}

/// Cleans untrusted text and bounds it to `max_len` code points.
///
/// Never fails. Empty input yields empty output, and `sanitize(&sanitize(s, n), n)`
/// equals `sanitize(s, n)`.
pub fn sanitize(raw: &str, max_len: usize) -> String {
    if raw.is_empty() || max_len == 0 {
        return String::new();
    }

    // (a) compatibility-composed form
    let normalized: String = raw.nfkc().collect();

    // (b) ASCII controls out; line breaks and tabs act as word separators
    // (c) zero-width and bidi controls out
    let visible: String = normalized
        .chars()
        .filter_map(|c| match c {
            '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' => Some(' '),
            c if c.is_ascii_control() => None,
            c if is_invisible(c) => None,
            c => Some(c),
        })
        .collect();

    // (d) collapse whitespace runs
    let collapsed = visible.split_whitespace().collect::<Vec<_>>().join(" ");

    // (e) allow-list
    let filtered: String = collapsed.chars().filter(|c| is_safe_char(*c)).collect();
    let filtered: String = filtered.nfkc().collect();
    // dropped characters can leave two separators side by side
    let filtered = filtered.split_whitespace().collect::<Vec<_>>().join(" ");

    // (f) bound
    let truncated: String = filtered.chars().take(max_len).collect();
    let truncated = truncated.trim();

    // (g) residual markup
    markup_tag().replace_all(truncated, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(sanitize("", 100), "");
        assert_eq!(sanitize("   \n\t ", 100), "");
    }

    #[test]
    fn test_strips_ascii_controls() {
        let out = sanitize("Jane\x00 Doe\x07\x7f", 100);
        assert_eq!(out, "Jane Doe");
        assert!(!out.chars().any(|c| c.is_ascii_control()));
    }

    #[test]
    fn test_line_breaks_become_single_spaces() {
        assert_eq!(sanitize("Built\nthings\r\n\tfast", 100), "Built things fast");
    }

    #[test]
    fn test_strips_bidi_and_zero_width() {
        let raw = "admin\u{202E}gnp.exe\u{200B} \u{2066}x\u{2069}\u{FEFF}";
        let out = sanitize(raw, 100);
        assert_eq!(out, "admingnp.exe x");
        assert!(!out.chars().any(is_invisible));
    }

    #[test]
    fn test_normalizes_compatibility_forms() {
        // fullwidth letters and the "fi" ligature
        assert_eq!(sanitize("\u{FF32}ust \u{FB01}le", 100), "Rust file");
    }

    #[test]
    fn test_composes_accents() {
        assert_eq!(sanitize("Jose\u{0301}", 100), "Jos\u{00E9}");
    }

    #[test]
    fn test_drops_angle_brackets_and_unsafe_symbols() {
        let out = sanitize("<script>alert(1)</script> ok\u{00A7}", 100);
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(out.ends_with("ok"));
    }

    #[test]
    fn test_keeps_safe_punctuation() {
        let raw = "C++ & Rust: 100% (async/await) #1!";
        assert_eq!(sanitize(raw, 100), raw);
    }

    #[test]
    fn test_length_bound_in_code_points() {
        let raw = "\u{00E9}".repeat(50);
        let out = sanitize(&raw, 10);
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_space() {
        let out = sanitize("abc def", 4);
        assert_eq!(out, "abc");
        assert_eq!(sanitize(&out, 4), out);
    }

    #[test]
    fn test_bound_holds_for_mixed_inputs() {
        let inputs = [
            "plain text",
            "\u{202E}\u{202E}\u{202E}",
            "a\u{200D}b\u{200D}c\u{200D}d",
            "  lots   of   space   between   words  ",
            "\u{FF21}\u{FF22}\u{FF23}\u{FF24}\u{FF25}\u{FF26}",
            "tabs\tand\nnewlines\rand\x0bvt",
        ];
        for raw in inputs {
            for n in [0, 1, 3, 8, 64] {
                let out = sanitize(raw, n);
                assert!(out.chars().count() <= n, "{raw:?} with bound {n}");
                assert!(!out.chars().any(|c| c.is_control() || is_invisible(c)));
            }
        }
    }

    #[test]
    fn test_removed_char_between_spaces_leaves_one_space() {
        assert_eq!(sanitize("a \u{00A7} b", 100), "a b");
        assert_eq!(sanitize("R \u{2122}\u{00B6} D", 100), "R TM D");
        assert_eq!(sanitize("Led R \u{00A7} D team", 100), "Led R D team");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Jane \u{202E}Doe\u{200B}",
            "  Senior   Engineer / Platform  ",
            "x<y and y>z",
            "\u{FF32}ust\tand\nGo",
            "summary with trailing cut here",
            "a \u{00A7} b",
        ];
        for raw in inputs {
            let once = sanitize(raw, 12);
            assert_eq!(sanitize(&once, 12), once, "input {raw:?}");
        }
    }
}
