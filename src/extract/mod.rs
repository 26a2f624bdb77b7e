//! Pure extraction from raw knowledge-base records: identifier sanitation,
//! biographical facts, and parent/child relations. No I/O anywhere in this
//! module; ambiguous data becomes field omission, never an error.

mod facts;
mod ids;
mod relations;

pub use facts::{extract_facts, Facts};
pub use ids::{is_entity_id, sanitize_ids};
pub use relations::{extract_relations, statement_targets, Relations};
