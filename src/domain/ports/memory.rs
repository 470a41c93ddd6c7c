//! Memory substrate port.
//!
//! The federated memory (L1 ANN / L2 disk-ANN / L3 object store) lives
//! outside the core. The core issues at most one request per suspension
//! point per cycle; the substrate owns its own concurrency policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::HrcResult;

/// One hit from a semantic search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub similarity: f64,
    pub payload: Value,
    pub id: String,
}

/// Response from [`MemorySubstrate::semantic_search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<SearchHit>,
}

/// One summary hit from a global (summary-level) search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryHit {
    pub similarity: f64,
    pub payload: Value,
}

/// Response from [`MemorySubstrate::global_semantic_search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSearchResponse {
    pub success: bool,
    pub summaries: Vec<SummaryHit>,
}

/// Contract with the vector memory substrate.
#[async_trait]
pub trait MemorySubstrate: Send + Sync {
    /// Search item-level memory for the query text.
    async fn semantic_search(
        &self,
        query_text: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> HrcResult<SearchResponse>;

    /// Search summary-level memory for the query text.
    async fn global_semantic_search(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> HrcResult<GlobalSearchResponse>;

    /// Whether this substrate can re-rank candidates via graph traversal.
    /// Without re-ranking, disambiguation falls back to the first candidate
    /// at reduced confidence.
    fn supports_graph_rerank(&self) -> bool {
        false
    }

    /// Re-rank candidates using the knowledge graph. The default returns the
    /// candidates unchanged.
    async fn graph_rerank(&self, candidates: Vec<SearchHit>) -> HrcResult<Vec<SearchHit>> {
        Ok(candidates)
    }
}
