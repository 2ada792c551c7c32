//! Wikilink extraction for `[[Page Name]]` syntax.
//!
//! The extractor is a pure function over the raw page text: no escaping, no
//! nesting, no aliases. Anything between `[[` and the next `]]` that contains
//! no `]` is a link; unbalanced brackets simply don't match.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid wikilink regex"));

/// Extract the distinct page names referenced by `content`.
///
/// Names are trimmed, empty names are dropped, and each name appears once in
/// order of its first occurrence.
pub fn extract_wikilinks(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for cap in WIKILINK_RE.captures_iter(content) {
        // Borrow from `content`, which outlives the per-match `Captures`
        let Some(name) = cap.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        if name.is_empty() || !seen.insert(name) {
            continue;
        }
        names.push(name.to_string());
    }

    names
}

/// Whether `content` links to the page called `name`.
pub fn references(content: &str, name: &str) -> bool {
    // Cheap pre-check before running the regex over every page during healing
    if !content.contains(name) {
        return false;
    }
    WIKILINK_RE
        .captures_iter(content)
        .any(|cap| cap[1].trim() == name)
}
