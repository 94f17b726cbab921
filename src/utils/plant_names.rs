//! Plant name handling
//!
//! Every comparison in the rule store and resolver goes through
//! `canonicalize` (trim + lowercase). Display names capitalise the first
//! letter, as in the plant chooser's selection list.

/// Canonical lookup key for a plant name
pub fn canonicalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// "sweet potato" -> "Sweet potato"
pub fn display_name(name: &str) -> String {
    let key = canonicalize(name);
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
