//! Knowledge-base surface: the client trait, the property constants the
//! extractors consume, and the raw entity types.
//!
//! The property ids are fixed external constants of the public knowledge
//! base — configuration, not protocol surface.

mod mock;
mod types;
mod wikidata;

pub use mock::MockKnowledgeBase;
pub use types::{Claim, ClaimMap, DataValue, LanguageValue, RawEntity, Sitelink, Snak};
pub use wikidata::WikidataClient;

use crate::error::Result;
use crate::person::SearchHit;
use async_trait::async_trait;
use std::collections::HashMap;

/// Class-membership (instance-of) property.
pub const PROP_INSTANCE_OF: &str = "P31";
/// Date of birth.
pub const PROP_DATE_OF_BIRTH: &str = "P569";
/// Date of death.
pub const PROP_DATE_OF_DEATH: &str = "P570";
/// Image (a Commons file name as a string value).
pub const PROP_IMAGE: &str = "P18";
/// Father.
pub const PROP_FATHER: &str = "P22";
/// Mother.
pub const PROP_MOTHER: &str = "P25";
/// Child.
pub const PROP_CHILD: &str = "P40";

/// The "human" class; an entity is a person iff an instance-of statement
/// targets exactly this id.
pub const CLASS_HUMAN: &str = "Q5";

/// Temporal precision code for "year". Finer granularities (month, day)
/// use larger codes; coarser ones (decade, century) use smaller ones.
pub const PRECISION_YEAR: i64 = 9;

/// Client interface to the remote knowledge base.
///
/// The core consumes this trait only; `WikidataClient` talks to the live
/// service and `MockKnowledgeBase` serves tests and offline demos.
#[async_trait]
pub trait KnowledgeBaseClient: Send + Sync {
    /// Free-text entity search returning at most `limit` hits, in relevance
    /// order. Hits are generic entities; human filtering happens upstream.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Fetch raw records for `ids` in one batched call. Ids unknown to the
    /// knowledge base are simply absent from the returned map.
    async fn get_entities(&self, ids: &[String]) -> Result<HashMap<String, RawEntity>>;
}
