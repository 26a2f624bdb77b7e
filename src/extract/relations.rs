//! Parent/child relation extraction from raw claims.

use crate::extract::ids::sanitize_ids;
use crate::kb::{ClaimMap, PROP_CHILD, PROP_FATHER, PROP_MOTHER};

/// Deduplicated relation identifier lists for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    pub parent_ids: Vec<String>,
    pub child_ids: Vec<String>,
}

/// Target entity ids of all value statements for `property`, in statement
/// order. Not sanitized; callers decide what a valid target is.
pub fn statement_targets(claims: &ClaimMap, property: &str) -> Vec<String> {
    claims
        .get(property)
        .into_iter()
        .flatten()
        .filter_map(|claim| claim.entity_id())
        .collect()
}

/// Extract relations. Pure, no I/O.
///
/// Parents are the order-preserving deduplicated union of father and mother
/// statement values; children come from the child property. Malformed
/// targets are dropped silently.
pub fn extract_relations(claims: &ClaimMap) -> Relations {
    let fathers = statement_targets(claims, PROP_FATHER);
    let mothers = statement_targets(claims, PROP_MOTHER);
    let parent_ids = sanitize_ids(fathers.iter().chain(mothers.iter()));

    let child_ids = sanitize_ids(statement_targets(claims, PROP_CHILD));

    Relations {
        parent_ids,
        child_ids,
    }
}
