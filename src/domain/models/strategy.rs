//! Reasoning strategy model.
//!
//! A strategy is a named reasoning approach with prior success, cost, and
//! goal-value parameters. Priors are seeded at init; running statistics live
//! in the strategy registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The enumerated reasoning strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// Semantic search over the federated memory.
    VsaNative,
    /// Memory search followed by graph re-ranking.
    GraphDisambiguation,
    /// LLM transduction of the query into tool calls.
    LlmDecomposition,
    /// Summary-level semantic search.
    GlobalSearch,
}

impl StrategyId {
    pub const ALL: [StrategyId; 4] = [
        Self::VsaNative,
        Self::GraphDisambiguation,
        Self::LlmDecomposition,
        Self::GlobalSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VsaNative => "vsa_native",
            Self::GraphDisambiguation => "graph_disambiguation",
            Self::LlmDecomposition => "llm_decomposition",
            Self::GlobalSearch => "global_search",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vsa_native" => Some(Self::VsaNative),
            "graph_disambiguation" => Some(Self::GraphDisambiguation),
            "llm_decomposition" => Some(Self::LlmDecomposition),
            "global_search" => Some(Self::GlobalSearch),
            _ => None,
        }
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reasoning strategy with its current priors.
///
/// `expected_success`, `expected_cost`, and `goal_value` all stay inside
/// [0, 1] across every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub display_name: String,
    /// Prior probability of the strategy resolving a query (P).
    pub expected_success: f64,
    /// Expected resource cost (C).
    pub expected_cost: f64,
    /// Value of achieving the goal via this strategy (G).
    pub goal_value: f64,
}

impl Strategy {
    pub fn new(
        id: StrategyId,
        display_name: impl Into<String>,
        expected_success: f64,
        expected_cost: f64,
        goal_value: f64,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            expected_success: expected_success.clamp(0.0, 1.0),
            expected_cost: expected_cost.clamp(0.0, 1.0),
            goal_value: goal_value.clamp(0.0, 1.0),
        }
    }

    /// The seeded strategy catalog.
    pub fn seed_catalog() -> Vec<Strategy> {
        vec![
            Strategy::new(StrategyId::VsaNative, "VSA native search", 0.7, 0.2, 1.0),
            Strategy::new(
                StrategyId::GraphDisambiguation,
                "Graph disambiguation",
                0.8,
                0.5,
                1.0,
            ),
            Strategy::new(
                StrategyId::LlmDecomposition,
                "LLM decomposition",
                0.9,
                0.8,
                1.0,
            ),
            Strategy::new(StrategyId::GlobalSearch, "Global summary search", 0.6, 0.9, 1.0),
        ]
    }
}

/// Running statistics for a strategy, kept alongside the priors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub attempts: u64,
    pub successes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StrategyStats {
    pub fn record(&mut self, success: bool) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        }
        self.updated_at = Some(Utc::now());
    }

    pub fn success_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(self.successes as f64 / self.attempts as f64)
        }
    }
}
