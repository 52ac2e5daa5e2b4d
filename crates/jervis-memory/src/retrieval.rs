//! RAG Pipeline (C6): fan out queries to the hybrid store, aggregate
//! deterministically, synthesize a single answer.

use std::collections::HashMap;

use futures::future::join_all;
use jervis_core::model::TaskContext;
use jervis_llm::gateway::Gateway;
use jervis_llm::prompt::{PromptType, SYNTHESIS_PROMPT};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hybrid_store::HybridStore;
use crate::types::{DocumentChunk, HybridSearchContext};

/// Build the filter context for one query from the owning task context.
fn context_for(task_context: &TaskContext, limit: u32, min_score: f32) -> HybridSearchContext {
    HybridSearchContext {
        client_id: task_context.client_id,
        project_id: task_context.project_id,
        limit,
        min_score,
        hybrid_alpha: HybridSearchContext::DEFAULT_HYBRID_ALPHA,
    }
}

async fn execute_single_query(
    store: &dyn HybridStore,
    query: &str,
    task_context: &TaskContext,
    limit: u32,
    min_score: f32,
) -> Result<Vec<DocumentChunk>> {
    store.hybrid_search(query, &context_for(task_context, limit, min_score)).await
}

/// Join every query's results and sort deterministically: `(score desc,
/// naturalKey asc)` so repeated queries against unchanged data produce
/// reproducible ordering, per §4.6.
fn aggregate(results: Vec<Result<Vec<DocumentChunk>>>) -> Vec<DocumentChunk> {
    let mut chunks: Vec<DocumentChunk> = results.into_iter().filter_map(std::result::Result::ok).flatten().collect();
    chunks.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| natural_key(a).cmp(&natural_key(b)))
    });
    chunks
}

fn natural_key(chunk: &DocumentChunk) -> &str {
    chunk.metadata.get("natural_key").map_or("", String::as_str)
}

#[derive(Debug, Serialize, Deserialize)]
struct SynthesisOutput {
    answer: String,
}

/// `executeRagPipeline(queries, originalQuery, plan)`: run every query
/// concurrently, aggregate deterministically, then synthesize a single
/// answer via the gateway's fixed `SYNTHESIS` prompt type.
pub async fn execute_rag_pipeline(
    store: &dyn HybridStore,
    gateway: &Gateway,
    queries: &[String],
    original_query: &str,
    task_context: &TaskContext,
    limit: u32,
    min_score: f32,
) -> Result<String> {
    let chunks = execute_raw_search(store, queries, task_context, limit, min_score).await?;

    let search_results = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n");

    let mut mapping = HashMap::new();
    mapping.insert("original_query".to_string(), original_query.to_string());
    mapping.insert("context_summary".to_string(), task_context.context_summary.clone());
    mapping.insert("search_results".to_string(), search_results);

    let prompt_type = PromptType::new(SYNTHESIS_PROMPT);
    let correlation_id = task_context.id.to_string();
    let response = gateway
        .call_llm::<SynthesisOutput>(&prompt_type, &mapping, task_context.quick, false, &correlation_id)
        .await
        .map_err(|e| Error::Synthesis(e.to_string()))?;

    Ok(response.result.answer)
}

/// `executeRawSearch(queries, plan)`: the aggregated chunk list, sorted
/// deterministically, with no synthesis step.
pub async fn execute_raw_search(
    store: &dyn HybridStore,
    queries: &[String],
    task_context: &TaskContext,
    limit: u32,
    min_score: f32,
) -> Result<Vec<DocumentChunk>> {
    let futures = queries.iter().map(|q| execute_single_query(store, q, task_context, limit, min_score));
    Ok(aggregate(join_all(futures).await))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use jervis_core::ids::ClientId;

    use super::*;

    struct FixedStore {
        chunks: Vec<DocumentChunk>,
    }

    #[async_trait]
    impl HybridStore for FixedStore {
        async fn hybrid_search(&self, _text: &str, _context: &HybridSearchContext) -> Result<Vec<DocumentChunk>> {
            Ok(self.chunks.clone())
        }
    }

    fn chunk(score: f32, natural_key: &str) -> DocumentChunk {
        let mut metadata = HashMap::new();
        metadata.insert("natural_key".to_string(), natural_key.to_string());
        DocumentChunk { score, content: format!("chunk {natural_key}"), metadata }
    }

    fn context() -> TaskContext {
        TaskContext::new(ClientId::new(), None)
    }

    #[tokio::test]
    async fn raw_search_sorts_by_score_desc_then_natural_key_asc() {
        let store = FixedStore {
            chunks: vec![chunk(0.5, "b"), chunk(0.9, "a"), chunk(0.5, "a")],
        };
        let context = context();
        let results = execute_raw_search(&store, &["q".to_string()], &context, 10, 0.0).await.unwrap();

        let keys: Vec<&str> = results.iter().map(natural_key).collect();
        assert_eq!(keys, vec!["a", "a", "b"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn raw_search_joins_every_query_result() {
        let store = FixedStore { chunks: vec![chunk(1.0, "a")] };
        let context = context();
        let results = execute_raw_search(&store, &["q1".to_string(), "q2".to_string()], &context, 10, 0.0)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
