//! Comma-separated list normalization (skills, certifications, languages).

use std::collections::HashSet;

/// Technical punctuation allowed inside list tokens ("C++", "C#", "Node.js", "CI-CD").
const TOKEN_PUNCTUATION: &[char] = &['+', '#', '.', '-'];

/// Separator used when a normalized list is re-joined for display or storage.
pub const LIST_SEPARATOR: &str = ", ";

fn is_token_char(c: char) -> bool {
    c == ' ' || c.is_alphanumeric() || TOKEN_PUNCTUATION.contains(&c)
}

fn clean_token(piece: &str, max_item_len: usize) -> String {
    let collapsed = piece.split_whitespace().collect::<Vec<_>>().join(" ");
    let filtered: String = collapsed.chars().filter(|c| is_token_char(*c)).collect();
    // filtering can leave double spaces where a symbol sat between two words
    let filtered = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = filtered.chars().take(max_item_len).collect();
    truncated.trim().to_string()
}

/// Splits `raw` on commas into a bounded, case-insensitively deduplicated list.
///
/// First-seen casing and order win: `"Python, python, PYTHON"` gives `["Python"]`.
/// Re-normalizing the joined output returns the same list.
pub fn normalize_list(raw: &str, max_item_len: usize, max_items: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for piece in raw.split(',') {
        if items.len() >= max_items {
            break;
        }
        let token = clean_token(piece, max_item_len);
        if token.is_empty() {
            continue;
        }
        if seen.insert(token.to_lowercase()) {
            items.push(token);
        }
    }

    items
}

/// Drops trailing items until the joined form fits within `max_joined_len` code points.
pub fn cap_joined_len(mut items: Vec<String>, max_joined_len: usize) -> Vec<String> {
    while !items.is_empty() && joined_len(&items) > max_joined_len {
        items.pop();
    }
    items
}

fn joined_len(items: &[String]) -> usize {
    let sep = LIST_SEPARATOR.chars().count() * items.len().saturating_sub(1);
    items.iter().map(|s| s.chars().count()).sum::<usize>() + sep
}
