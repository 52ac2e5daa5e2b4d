//! The hybrid (keyword + vector) store contract (§6 "Vector store").
//!
//! This crate never implements the store itself — indexing writes and
//! `hybridSearch` reads both go through this abstract contract, concretely
//! backed by whatever embedding/keyword service a deployment wires in.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{DocumentChunk, HybridSearchContext};

/// Abstract `hybridSearch(text, context) -> List<DocumentChunk>`.
#[async_trait]
pub trait HybridStore: Send + Sync {
    /// Run one hybrid search; the implementation applies `min_score` and
    /// `limit` server-side — callers never re-filter the result set.
    async fn hybrid_search(&self, text: &str, context: &HybridSearchContext) -> Result<Vec<DocumentChunk>>;
}

/// A `HybridStore` reached over HTTP, the default wiring for a deployment
/// that runs its embedding/keyword index as a separate service.
pub struct HttpHybridStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHybridStore {
    /// Build a store client against `base_url` (e.g. `http://localhost:8090`).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[derive(serde::Serialize)]
struct SearchRequest<'a> {
    text: &'a str,
    client_id: String,
    project_id: Option<String>,
    limit: u32,
    min_score: f32,
    hybrid_alpha: f32,
}

#[derive(serde::Deserialize)]
struct SearchResponse {
    chunks: Vec<DocumentChunk>,
}

#[async_trait]
impl HybridStore for HttpHybridStore {
    async fn hybrid_search(&self, text: &str, context: &HybridSearchContext) -> Result<Vec<DocumentChunk>> {
        let url = format!("{}/hybrid-search", self.base_url.trim_end_matches('/'));
        let request = SearchRequest {
            text,
            client_id: context.client_id.to_string(),
            project_id: context.project_id.map(|p| p.to_string()),
            limit: context.limit,
            min_score: context.min_score,
            hybrid_alpha: context.hybrid_alpha,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::HybridStore(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::HybridStore(format!("hybrid search returned {}", response.status())));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::HybridStore(format!("malformed response: {e}")))?;
        Ok(body.chunks)
    }
}
