//! Entity-identifier sanitation, shared by relation extraction and search.

use regex::Regex;
use std::collections::HashSet;

/// Return true if `id` matches the entity identifier grammar `Q<digits>`.
pub fn is_entity_id(id: &str) -> bool {
    let pattern = Regex::new(r"^Q[0-9]+$").expect("Invalid identifier pattern");
    pattern.is_match(id)
}

/// Keep well-formed entity ids, preserving first-occurrence order and
/// dropping duplicates. Malformed ids are discarded silently, wherever they
/// came from. Idempotent: sanitizing a sanitized list is a no-op.
pub fn sanitize_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pattern = Regex::new(r"^Q[0-9]+$").expect("Invalid identifier pattern");
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        let id = id.as_ref().trim();
        if !pattern.is_match(id) {
            continue;
        }
        if seen.insert(id.to_string()) {
            out.push(id.to_string());
        }
    }
    out
}
