//! Display-name clean-up shared by the roster, participants and chat readers.

use std::sync::OnceLock;

use regex::Regex;

fn parenthetical() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(.*\)").expect("regex is valid"))
}

/// Remove a parenthesised suffix such as a pronoun or original name.
///
/// ```
/// use attendance_core::names::strip_parenthetical;
///
/// assert_eq!(strip_parenthetical("Jane Doe (she/her)"), "Jane Doe");
/// assert_eq!(strip_parenthetical("Jane Doe"), "Jane Doe");
/// ```
pub fn strip_parenthetical(name: &str) -> String {
    parenthetical().replace_all(name, "").trim().to_string()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a raw display name the way every reader does before matching.
pub fn clean_display_name(raw: &str) -> String {
    collapse_whitespace(&strip_parenthetical(raw))
}

/// Case- and punctuation-insensitive comparison key.
///
/// Periods are dropped (`"John S."` → `"john s"`) and whitespace collapsed.
pub fn match_key(name: &str) -> String {
    collapse_whitespace(&name.replace('.', " ")).to_lowercase()
}

/// Lowercased whitespace-separated tokens of [`match_key`].
pub fn tokens(name: &str) -> Vec<String> {
    match_key(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
