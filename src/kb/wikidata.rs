//! Live client for the Wikidata Action API.

use crate::error::{KintreeError, Result};
use crate::kb::{KnowledgeBaseClient, RawEntity};
use crate::person::SearchHit;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;

/// Client for the public knowledge-base API.
///
/// Issues `wbsearchentities` for free-text search and `wbgetentities` for
/// batched record fetches. Non-success HTTP statuses and API-level error
/// payloads both surface as transport errors.
pub struct WikidataClient {
    client: Client,
    endpoint: String,
    language: String,
}

impl WikidataClient {
    /// Create a new client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation)
    pub fn new(endpoint: &str, language: &str, timeout_secs: u64, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.to_string(),
            language: language.to_string(),
        }
    }

    /// Issue one GET against the Action API and return the decoded JSON body.
    async fn call(&self, params: &[(&str, &str)]) -> Result<JsonValue> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(|e| KintreeError::Transport(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(KintreeError::Transport(format!(
                "Knowledge base API error {}: {}",
                status, body
            )));
        }

        let json: JsonValue = response
            .json()
            .await
            .map_err(|e| KintreeError::Transport(format!("Failed to parse response: {}", e)))?;

        // The Action API reports failures inside a 200 body
        if let Some(error) = json.get("error") {
            let info = error
                .get("info")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown API error");
            return Err(KintreeError::Transport(format!(
                "Knowledge base API error: {}",
                info
            )));
        }

        Ok(json)
    }
}

#[async_trait]
impl KnowledgeBaseClient for WikidataClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit_str = limit.to_string();
        let json = self
            .call(&[
                ("action", "wbsearchentities"),
                ("search", query),
                ("language", &self.language),
                ("uselang", &self.language),
                ("type", "item"),
                ("limit", &limit_str),
            ])
            .await?;

        let hits = json
            .get("search")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let id = entry.get("id")?.as_str()?.to_string();
                        let label = entry
                            .get("label")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        let description = entry
                            .get("description")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        Some(SearchHit {
                            id,
                            label,
                            description,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn get_entities(&self, ids: &[String]) -> Result<HashMap<String, RawEntity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.join("|");
        let json = self
            .call(&[
                ("action", "wbgetentities"),
                ("ids", &joined),
                ("props", "labels|descriptions|claims|sitelinks"),
            ])
            .await?;

        let mut entities = HashMap::new();
        if let Some(JsonValue::Object(map)) = json.get("entities") {
            for (id, record) in map {
                // Unknown ids come back as {"id": ..., "missing": ""}
                if record.get("missing").is_some() {
                    log::debug!("Entity {} missing from knowledge base", id);
                    continue;
                }
                match serde_json::from_value::<RawEntity>(record.clone()) {
                    Ok(entity) => {
                        entities.insert(id.clone(), entity);
                    }
                    Err(e) => {
                        log::warn!("Skipping malformed entity record {}: {}", id, e);
                    }
                }
            }
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = WikidataClient::new(
            "https://www.wikidata.org/w/api.php",
            "en",
            10,
            "kintree-test",
        );
        assert_eq!(client.endpoint, "https://www.wikidata.org/w/api.php");
        assert_eq!(client.language, "en");
    }

    // Note: request/response behavior is exercised against MockKnowledgeBase;
    // live API integration is not part of the unit test suite.
}
