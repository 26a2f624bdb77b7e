//! Serde types for the raw Wikibase entity shape.
//!
//! Only the fields the extractors consume are modeled; statement values stay
//! as loosely typed JSON until extraction decides what they are. Records are
//! never mutated by the core.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Claims keyed by property id (`P...`), each holding a statement list.
pub type ClaimMap = HashMap<String, Vec<Claim>>;

/// A raw knowledge-base record as returned by the batched entity fetch.
///
/// Labels and descriptions use a sorted map so "first available language"
/// is deterministic when English is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub labels: BTreeMap<String, LanguageValue>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, LanguageValue>,
    #[serde(default)]
    pub claims: ClaimMap,
    #[serde(default)]
    pub sitelinks: HashMap<String, Sitelink>,
}

/// One monolingual text value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageValue {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub value: String,
}

/// A per-site link, e.g. the `enwiki` article title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sitelink {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub title: String,
}

/// One statement about an entity. Qualifiers and references are not consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claim {
    #[serde(default)]
    pub mainsnak: Snak,
}

/// The main (property, value) pair of a statement.
///
/// `snaktype` is `"value"` for concrete values; `"somevalue"`/`"novalue"`
/// statements carry no datavalue and are skipped by the extractors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snak {
    #[serde(default)]
    pub snaktype: String,
    #[serde(default)]
    pub datavalue: Option<DataValue>,
}

/// A typed statement value. The payload shape depends on `value_type`:
/// a plain string, a `wikibase-entityid` object, or a `time` object with
/// a signed-era date string and an integer precision code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValue {
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Claim {
    /// Target entity id of a `wikibase-entityid` value snak, if any.
    pub fn entity_id(&self) -> Option<String> {
        let dv = self.mainsnak.datavalue.as_ref()?;
        if dv.value_type != "wikibase-entityid" {
            return None;
        }
        if let Some(id) = dv.value.get("id").and_then(|v| v.as_str()) {
            return Some(id.to_string());
        }
        // Older records carry only the numeric form
        dv.value
            .get("numeric-id")
            .and_then(|v| v.as_u64())
            .map(|n| format!("Q{}", n))
    }

    /// Plain string value of a `string` value snak, if any.
    pub fn string_value(&self) -> Option<&str> {
        let dv = self.mainsnak.datavalue.as_ref()?;
        if dv.value_type != "string" {
            return None;
        }
        dv.value.as_str()
    }

    /// Time payload of a `time` value snak: the signed-era date string and
    /// its precision code.
    pub fn time_value(&self) -> Option<(&str, i64)> {
        let dv = self.mainsnak.datavalue.as_ref()?;
        if dv.value_type != "time" {
            return None;
        }
        let time = dv.value.get("time").and_then(|v| v.as_str())?;
        let precision = dv.value.get("precision").and_then(|v| v.as_i64())?;
        Some((time, precision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_from_json(json: &str) -> Claim {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_entity_id_from_modern_value() {
        let claim = claim_from_json(
            r#"{"mainsnak":{"snaktype":"value","datavalue":{"type":"wikibase-entityid","value":{"entity-type":"item","numeric-id":5,"id":"Q5"}}}}"#,
        );
        assert_eq!(claim.entity_id(), Some("Q5".to_string()));
    }

    #[test]
    fn test_entity_id_from_numeric_only_value() {
        let claim = claim_from_json(
            r#"{"mainsnak":{"snaktype":"value","datavalue":{"type":"wikibase-entityid","value":{"entity-type":"item","numeric-id":3044}}}}"#,
        );
        assert_eq!(claim.entity_id(), Some("Q3044".to_string()));
    }

    #[test]
    fn test_entity_id_rejects_other_value_types() {
        let claim = claim_from_json(
            r#"{"mainsnak":{"snaktype":"value","datavalue":{"type":"string","value":"Q5"}}}"#,
        );
        assert_eq!(claim.entity_id(), None);
    }

    #[test]
    fn test_novalue_snak_has_no_payload() {
        let claim = claim_from_json(r#"{"mainsnak":{"snaktype":"novalue"}}"#);
        assert_eq!(claim.entity_id(), None);
        assert_eq!(claim.string_value(), None);
        assert_eq!(claim.time_value(), None);
    }

    #[test]
    fn test_time_value() {
        let claim = claim_from_json(
            r#"{"mainsnak":{"snaktype":"value","datavalue":{"type":"time","value":{"time":"+1952-03-11T00:00:00Z","precision":11}}}}"#,
        );
        assert_eq!(claim.time_value(), Some(("+1952-03-11T00:00:00Z", 11)));
    }

    #[test]
    fn test_raw_entity_defaults_for_sparse_record() {
        let entity: RawEntity = serde_json::from_str(r#"{"id":"Q42"}"#).unwrap();
        assert_eq!(entity.id, "Q42");
        assert!(entity.labels.is_empty());
        assert!(entity.claims.is_empty());
        assert!(entity.sitelinks.is_empty());
    }
}
