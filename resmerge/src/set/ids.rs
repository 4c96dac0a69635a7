//! Implicit `@+id/name` declarations in layout and menu XML.

use std::sync::OnceLock;

use regex::Regex;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"@\+id/([A-Za-z0-9_.]+)").expect("valid pattern"))
}

/// Extracts `@+id/` declarations from XML content, first occurrence wins.
pub fn extract_declared_ids(content: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    for capture in id_pattern().captures_iter(content) {
        let name = &capture[1];
        if seen.insert(name.to_string()) {
            ids.push(name.to_string());
        }
    }
    ids
}
