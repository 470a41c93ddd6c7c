//! Deterministic in-process memory substrate.
//!
//! `KeywordMemory` matches stored entries against queries by token overlap
//! and returns them in descending similarity order. It backs the CLI demo
//! surface and the test suite; production substrates live out of process
//! behind the same port.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::knowledge::tokenize;
use crate::domain::ports::memory::{
    GlobalSearchResponse, MemorySubstrate, SearchHit, SearchResponse, SummaryHit,
};

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    payload: Value,
    similarity: f64,
}

/// Keyword-overlap memory substrate.
#[derive(Clone, Default)]
pub struct KeywordMemory {
    entries: Arc<RwLock<Vec<Entry>>>,
    supports_rerank: bool,
    latency: Option<Duration>,
    failure: Option<String>,
    unavailable: bool,
}

impl KeywordMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable graph re-ranking support.
    pub fn with_graph_rerank(mut self) -> Self {
        self.supports_rerank = true;
        self
    }

    /// Delay every call, for timeout exercises.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call with a transient error.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Answer every call with an unsuccessful, empty response.
    pub fn with_unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Store an entry retrievable by token overlap with `key`.
    pub async fn insert(&self, key: impl Into<String>, payload: impl Into<String>, similarity: f64) {
        let mut entries = self.entries.write().await;
        entries.push(Entry {
            key: key.into(),
            payload: Value::String(payload.into()),
            similarity: similarity.clamp(0.0, 1.0),
        });
    }

    async fn simulate(&self) -> HrcResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(reason) = &self.failure {
            return Err(HrcError::Transient(reason.clone()));
        }
        Ok(())
    }

    async fn matches(&self, query_text: &str, min_similarity: f64) -> Vec<Entry> {
        let query_tokens = tokenize(query_text);
        let entries = self.entries.read().await;
        let mut hits: Vec<Entry> = entries
            .iter()
            .filter(|e| {
                e.similarity >= min_similarity
                    && tokenize(&e.key).iter().any(|t| query_tokens.contains(t))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }
}

#[async_trait]
impl MemorySubstrate for KeywordMemory {
    async fn semantic_search(
        &self,
        query_text: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> HrcResult<SearchResponse> {
        self.simulate().await?;
        if self.unavailable {
            return Ok(SearchResponse { success: false, results: Vec::new() });
        }
        let results = self
            .matches(query_text, min_similarity)
            .await
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, e)| SearchHit {
                similarity: e.similarity,
                payload: e.payload,
                id: format!("{}#{i}", e.key),
            })
            .collect();
        Ok(SearchResponse { success: true, results })
    }

    async fn global_semantic_search(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> HrcResult<GlobalSearchResponse> {
        self.simulate().await?;
        if self.unavailable {
            return Ok(GlobalSearchResponse { success: false, summaries: Vec::new() });
        }
        let summaries = self
            .matches(query_text, 0.0)
            .await
            .into_iter()
            .take(top_k)
            .map(|e| SummaryHit {
                similarity: e.similarity,
                payload: e.payload,
            })
            .collect();
        Ok(GlobalSearchResponse { success: true, summaries })
    }

    fn supports_graph_rerank(&self) -> bool {
        self.supports_rerank
    }

    async fn graph_rerank(&self, mut candidates: Vec<SearchHit>) -> HrcResult<Vec<SearchHit>> {
        self.simulate().await?;
        // Stable similarity order stands in for the graph traversal.
        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_matches_by_token_overlap() {
        let memory = KeywordMemory::new();
        memory.insert("entropy", "entropy is disorder", 0.86).await;
        memory.insert("enthalpy", "heat content", 0.9).await;

        let response = memory.semantic_search("what is entropy", 5, 0.1).await.unwrap();
        assert!(response.success);
        assert_eq!(response.results.len(), 1);
        assert!((response.results[0].similarity - 0.86).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn results_sorted_by_similarity() {
        let memory = KeywordMemory::new();
        memory.insert("term", "weak sense", 0.3).await;
        memory.insert("term", "strong sense", 0.9).await;

        let response = memory.semantic_search("term", 5, 0.1).await.unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(response.results[0].similarity > response.results[1].similarity);
    }

    #[tokio::test]
    async fn min_similarity_filters() {
        let memory = KeywordMemory::new();
        memory.insert("term", "weak", 0.05).await;
        let response = memory.semantic_search("term", 5, 0.1).await.unwrap();
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn failure_mode_returns_transient() {
        let memory = KeywordMemory::new().with_failure("offline");
        let err = memory.semantic_search("x", 5, 0.1).await.unwrap_err();
        assert!(matches!(err, HrcError::Transient(_)));
    }

    #[tokio::test]
    async fn unavailable_mode_reports_no_success() {
        let memory = KeywordMemory::new().with_unavailable();
        let response = memory.semantic_search("x", 5, 0.1).await.unwrap();
        assert!(!response.success);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn rerank_orders_by_similarity() {
        let memory = KeywordMemory::new().with_graph_rerank();
        assert!(memory.supports_graph_rerank());
        let hits = vec![
            SearchHit { similarity: 0.2, payload: Value::from("b"), id: "b".into() },
            SearchHit { similarity: 0.9, payload: Value::from("a"), id: "a".into() },
        ];
        let reranked = memory.graph_rerank(hits).await.unwrap();
        assert_eq!(reranked[0].id, "a");
    }
}
