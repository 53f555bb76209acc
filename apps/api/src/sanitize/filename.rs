/// Stem used when nothing usable survives sanitization.
pub const DEFAULT_STEM: &str = "resume";

const MAX_STEM_LEN: usize = 80;

/// Builds a filesystem-safe download name from a human-supplied stem.
///
/// Anything other than ASCII alphanumerics, `.`, `_` and `-` becomes `_`,
/// surrounding underscores are trimmed, and an empty result falls back to
/// [`DEFAULT_STEM`].
pub fn safe_filename(stem: &str, ext: &str) -> String {
    let replaced: String = stem
        .chars()
        .take(MAX_STEM_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = replaced.trim_matches('_');
    let stem = if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        DEFAULT_STEM
    } else {
        trimmed
    };

    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}
