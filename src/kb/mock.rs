//! In-memory knowledge base for tests and offline demos.
//!
//! Supports preconfigured entities and search hits, transport-failure
//! injection, latency simulation, and call counters for asserting fetch
//! volume (e.g. that concurrent resolutions share one fetch).

use crate::error::{KintreeError, Result};
use crate::kb::{KnowledgeBaseClient, RawEntity};
use crate::person::SearchHit;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Configurable in-memory stand-in for the remote knowledge base.
#[derive(Default)]
pub struct MockKnowledgeBase {
    entities: RwLock<HashMap<String, RawEntity>>,
    hits: RwLock<Vec<SearchHit>>,
    latency: RwLock<Option<Duration>>,
    fail_transport: AtomicBool,
    search_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw entity, keyed by its id.
    pub fn insert_entity(&self, entity: RawEntity) {
        self.entities
            .write()
            .unwrap()
            .insert(entity.id.clone(), entity);
    }

    /// Set the hit list returned by `search` (truncated to the limit).
    pub fn set_hits(&self, hits: Vec<SearchHit>) {
        *self.hits.write().unwrap() = hits;
    }

    /// Delay every call by `latency`, so tests can cancel mid-flight.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write().unwrap() = Some(latency);
    }

    /// Make every call fail with a transport error.
    pub fn fail_with_transport(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    /// Number of `search` calls issued so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_entities` calls issued so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> Result<()> {
        let latency = *self.latency.read().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(KintreeError::Transport(
                "mock transport failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KnowledgeBaseClient for MockKnowledgeBase {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let hits = self.hits.read().unwrap();
        Ok(hits.iter().take(limit).cloned().collect())
    }

    async fn get_entities(&self, ids: &[String]) -> Result<HashMap<String, RawEntity>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let entities = self.entities.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| entities.get(id).map(|e| (id.clone(), e.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str) -> RawEntity {
        RawEntity {
            id: id.to_string(),
            ..RawEntity::default()
        }
    }

    #[tokio::test]
    async fn test_mock_returns_registered_entities_only() {
        let kb = MockKnowledgeBase::new();
        kb.insert_entity(entity("Q1"));

        let ids = vec!["Q1".to_string(), "Q2".to_string()];
        let result = kb.get_entities(&ids).await.unwrap();

        assert!(result.contains_key("Q1"));
        assert!(!result.contains_key("Q2"));
        assert_eq!(kb.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_search_respects_limit() {
        let kb = MockKnowledgeBase::new();
        kb.set_hits(vec![
            SearchHit {
                id: "Q1".to_string(),
                label: "one".to_string(),
                description: String::new(),
            },
            SearchHit {
                id: "Q2".to_string(),
                label: "two".to_string(),
                description: String::new(),
            },
        ]);

        let hits = kb.search("anything", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Q1");
    }

    #[tokio::test]
    async fn test_mock_transport_failure() {
        let kb = MockKnowledgeBase::new();
        kb.fail_with_transport(true);

        let err = kb.search("x", 5).await.unwrap_err();
        assert!(matches!(err, KintreeError::Transport(_)));
    }
}
