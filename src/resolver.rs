//! Session-scoped entity resolution with a shared identifier cache.
//!
//! The cache is the only cross-branch shared mutable state in the core.
//! Entries are created on first request, shared by every branch referencing
//! the same id, and never evicted for the session's lifetime. Concurrent
//! resolutions of the same uncached id share one in-flight fetch through a
//! broadcast channel; a cancelled fetch leaves no entry behind, so waiters
//! retry with a fresh fetch of their own.

use crate::cancel::CancelToken;
use crate::error::{KintreeError, Result};
use crate::extract::{extract_facts, extract_relations, is_entity_id};
use crate::kb::{KnowledgeBaseClient, RawEntity};
use crate::person::Person;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// State of one cached identifier.
enum CacheEntry {
    /// A fetch is running; subscribers receive its outcome.
    InFlight(broadcast::Sender<Result<Person>>),
    /// Resolution succeeded.
    Ready(Person),
    /// Resolution failed terminally (not-found or transport).
    Failed(KintreeError),
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    pub hits: u64,
    pub misses: u64,
}

/// Resolves entity ids into normalized `Person` records through the
/// knowledge-base client, caching per session.
pub struct EntityResolver {
    client: Arc<dyn KnowledgeBaseClient>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EntityResolver {
    pub fn new(client: Arc<dyn KnowledgeBaseClient>) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve `id` into a `Person`.
    ///
    /// A cache hit (resolved record or terminal failure) returns without a
    /// network call. On a miss, exactly one fetch is issued; concurrent
    /// callers for the same id wait on that fetch and observe the same
    /// outcome. If `token` fires first the call returns `Cancelled` and
    /// writes nothing to the cache.
    pub async fn resolve(&self, id: &str, token: &CancelToken) -> Result<Person> {
        if !is_entity_id(id) {
            return Err(KintreeError::NotFound(id.to_string()));
        }

        loop {
            let waiter = {
                let mut cache = self.cache.lock().await;
                match cache.get(id) {
                    Some(CacheEntry::Ready(person)) => {
                        self.hits.fetch_add(1, Ordering::SeqCst);
                        log::debug!("Cache hit for {}", id);
                        return Ok(person.clone());
                    }
                    Some(CacheEntry::Failed(error)) => {
                        self.hits.fetch_add(1, Ordering::SeqCst);
                        log::debug!("Cached failure for {}", id);
                        return Err(error.clone());
                    }
                    Some(CacheEntry::InFlight(sender)) => Some(sender.subscribe()),
                    None => {
                        let (sender, _) = broadcast::channel(1);
                        cache.insert(id.to_string(), CacheEntry::InFlight(sender));
                        None
                    }
                }
            };

            match waiter {
                Some(mut receiver) => {
                    self.misses.fetch_add(1, Ordering::SeqCst);
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(KintreeError::Cancelled),
                        outcome = receiver.recv() => match outcome {
                            Ok(result) => return result,
                            // Owner cancelled before completing; retry with a fresh fetch
                            Err(_) => continue,
                        },
                    }
                }
                None => {
                    self.misses.fetch_add(1, Ordering::SeqCst);
                    return self.fetch_and_store(id, token).await;
                }
            }
        }
    }

    /// Run the owning fetch for an id this call just marked in-flight.
    async fn fetch_and_store(&self, id: &str, token: &CancelToken) -> Result<Person> {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.fetch(id) => Some(result),
        };

        let mut cache = self.cache.lock().await;
        let sender = match cache.remove(id) {
            Some(CacheEntry::InFlight(sender)) => Some(sender),
            _ => None,
        };

        match outcome {
            None => {
                // Dropping the sender closes the channel; waiters retry.
                drop(sender);
                drop(cache);
                log::debug!("Resolution of {} cancelled before completion", id);
                Err(KintreeError::Cancelled)
            }
            Some(result) => {
                let entry = match &result {
                    Ok(person) => CacheEntry::Ready(person.clone()),
                    Err(error) => CacheEntry::Failed(error.clone()),
                };
                cache.insert(id.to_string(), entry);
                drop(cache);
                if let Some(sender) = sender {
                    // Ignore send errors (no waiters)
                    let _ = sender.send(result.clone());
                }
                result
            }
        }
    }

    /// Fetch one raw record and normalize it.
    async fn fetch(&self, id: &str) -> Result<Person> {
        let ids = vec![id.to_string()];
        let mut entities = self.client.get_entities(&ids).await?;
        let raw = entities
            .remove(id)
            .ok_or_else(|| KintreeError::NotFound(id.to_string()))?;
        Ok(compose_person(id, &raw))
    }

    /// Number of settled cache entries plus in-flight resolutions.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.hits.load(Ordering::SeqCst),
            misses: self.misses.load(Ordering::SeqCst),
        }
    }
}

/// Pipe a raw record through fact and relation extraction.
fn compose_person(id: &str, raw: &RawEntity) -> Person {
    let facts = extract_facts(raw, id);
    let relations = extract_relations(&raw.claims);
    Person {
        id: id.to_string(),
        label: facts.label,
        description: facts.description,
        wikipedia_url: facts.wikipedia_url,
        image_url: facts.image_url,
        birth_year: facts.birth_year,
        death_year: facts.death_year,
        age: facts.age,
        parent_ids: relations.parent_ids,
        child_ids: relations.child_ids,
    }
}
