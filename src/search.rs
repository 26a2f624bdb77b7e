//! Two-phase person search.
//!
//! Phase one is a free-text entity search; phase two bulk-fetches the hits'
//! claims in a single batched call and keeps only entities whose
//! class-membership statement targets the human class. Non-human hits are
//! filtered out with no explanation; relevance order is preserved.
//!
//! [`SearchSession`] adds the interactive-session behavior on top: a
//! single-slot "latest request" register where a new search supersedes and
//! cancels any prior pending one, behind a fixed settle delay.

use crate::cancel::CancelToken;
use crate::error::{KintreeError, Result};
use crate::extract::{sanitize_ids, statement_targets};
use crate::kb::{KnowledgeBaseClient, RawEntity, CLASS_HUMAN, PROP_INSTANCE_OF};
use crate::person::SearchHit;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// Default bound on phase-one hit count.
pub const DEFAULT_SEARCH_LIMIT: usize = 12;

/// Default settle delay before a submitted search actually fires.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// True if the record carries a class-membership statement whose target is
/// exactly the human class.
pub fn is_human(entity: &RawEntity) -> bool {
    statement_targets(&entity.claims, PROP_INSTANCE_OF)
        .iter()
        .any(|target| target == CLASS_HUMAN)
}

/// Free-text search restricted to person entities.
pub struct PersonSearch {
    client: Arc<dyn KnowledgeBaseClient>,
    limit: usize,
}

impl PersonSearch {
    pub fn new(client: Arc<dyn KnowledgeBaseClient>) -> Self {
        Self {
            client,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_limit(client: Arc<dyn KnowledgeBaseClient>, limit: usize) -> Self {
        Self { client, limit }
    }

    /// Search for persons matching `query`, in relevance order.
    ///
    /// Fails with `Cancelled` if `token` fires first, or `Transport` if
    /// either phase fails. An empty result is a successful search with no
    /// matches, not an error.
    pub async fn search(&self, query: &str, token: &CancelToken) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let hits = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(KintreeError::Cancelled),
            result = self.client.search(query, self.limit) => result?,
        };
        log::debug!("Search \"{}\": {} raw hits", query, hits.len());

        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids = sanitize_ids(hits.iter().map(|hit| hit.id.as_str()));
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let entities = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(KintreeError::Cancelled),
            result = self.client.get_entities(&ids) => result?,
        };

        // A hit absent from the bulk response is treated as non-human
        // rather than as an error.
        let humans: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| entities.get(&hit.id).map_or(false, is_human))
            .collect();
        log::debug!("Search \"{}\": {} human hits", query, humans.len());

        Ok(humans)
    }
}

/// Single-slot "latest request wins" wrapper around [`PersonSearch`].
///
/// Submitting a query cancels whatever search currently occupies the slot,
/// then waits out the settle delay before touching the network, so a burst
/// of submissions collapses into the last one. Superseded searches fail
/// with `Cancelled`, which callers discard silently.
pub struct SearchSession {
    search: PersonSearch,
    settle: Duration,
    slot: Mutex<Option<CancelToken>>,
}

impl SearchSession {
    pub fn new(search: PersonSearch) -> Self {
        Self::with_settle_delay(search, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(search: PersonSearch, settle: Duration) -> Self {
        Self {
            search,
            settle,
            slot: Mutex::new(None),
        }
    }

    /// Submit a query, superseding any pending one.
    pub async fn submit(&self, query: &str) -> Result<Vec<SearchHit>> {
        let token = CancelToken::new();
        {
            let mut slot = self.slot.lock().unwrap();
            if let Some(previous) = slot.replace(token.clone()) {
                previous.cancel();
            }
        }

        sleep(self.settle).await;
        if token.is_cancelled() {
            return Err(KintreeError::Cancelled);
        }

        self.search.search(query, &token).await
    }
}
