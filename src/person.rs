use serde::{Deserialize, Serialize};

/// A normalized person record derived from a raw knowledge-base entity.
///
/// Invariant: `age` is present only when both years are present and
/// `death_year >= birth_year`. Contradictory records (birth after death)
/// carry no years at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Entity identifier, e.g. `Q1339`.
    pub id: String,
    /// Display label (English preferred, then first available language).
    pub label: String,
    /// Short description (same language fallback as the label).
    pub description: String,
    /// English Wikipedia article URL, only from the enwiki sitelink.
    pub wikipedia_url: Option<String>,
    /// Raw image statement value (a Commons file name, not a full URL).
    pub image_url: Option<String>,
    /// Signed birth year; zero and negative years are BCE.
    pub birth_year: Option<i32>,
    /// Signed death year; zero and negative years are BCE.
    pub death_year: Option<i32>,
    /// Years lived, `death_year - birth_year`.
    pub age: Option<u32>,
    /// Ordered, deduplicated father/mother entity ids.
    pub parent_ids: Vec<String>,
    /// Ordered, deduplicated child entity ids.
    pub child_ids: Vec<String>,
}

/// A single free-text search hit. Ephemeral: not cached beyond the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub label: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_serde_round_trip() {
        let person = Person {
            id: "Q3044".to_string(),
            label: "Charlemagne".to_string(),
            description: "King of the Franks".to_string(),
            wikipedia_url: Some("https://en.wikipedia.org/wiki/Charlemagne".to_string()),
            image_url: None,
            birth_year: Some(748),
            death_year: Some(814),
            age: Some(66),
            parent_ids: vec!["Q3045".to_string(), "Q154976".to_string()],
            child_ids: vec!["Q3055".to_string()],
        };

        let json = serde_json::to_string(&person).unwrap();
        let back: Person = serde_json::from_str(&json).unwrap();
        assert_eq!(back, person);
    }
}
