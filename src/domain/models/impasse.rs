//! Impasse and sub-goal domain model.
//!
//! An impasse is a named condition indicating the current strategy cannot
//! progress. Each impasse kind maps to a sub-goal template that attempts to
//! resolve it in-line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::Query;
use super::strategy::StrategyId;

/// A detected impasse with its descriptor payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "descriptor", rename_all = "snake_case")]
pub enum Impasse {
    /// The iteration produced no meaningful state change.
    StateNoChange { confidence_millis: u32 },
    /// Too many similarly-ranked candidates.
    OperatorTie { candidates: usize },
    /// The strategy selected no operator at all.
    OperatorNoChange { strategy: StrategyId },
    /// The selected operator raised a failure.
    OperatorFailure { strategy: StrategyId, reason: String },
}

impl Impasse {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::StateNoChange { .. } => "state_no_change",
            Self::OperatorTie { .. } => "operator_tie",
            Self::OperatorNoChange { .. } => "operator_no_change",
            Self::OperatorFailure { .. } => "operator_failure",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::StateNoChange { confidence_millis } => {
                format!("no state change (confidence {:.3})", f64::from(*confidence_millis) / 1000.0)
            }
            Self::OperatorTie { candidates } => {
                format!("{candidates} candidates tied")
            }
            Self::OperatorNoChange { strategy } => {
                format!("strategy {strategy} selected no operator")
            }
            Self::OperatorFailure { strategy, reason } => {
                format!("strategy {strategy} failed: {reason}")
            }
        }
    }
}

/// What a sub-goal is trying to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubGoalKind {
    /// Broaden the search space.
    Exploration,
    /// Separate tied candidates.
    Disambiguation,
    /// Synthesize what retrieval could not find.
    Generation,
    /// Recover from an operator failure.
    Recovery,
}

impl SubGoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Disambiguation => "disambiguation",
            Self::Generation => "generation",
            Self::Recovery => "recovery",
        }
    }
}

/// A derived query with a strategy hint, enqueued to resolve an impasse.
///
/// The strategy hint is always drawn from the strategy registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubGoal {
    pub kind: SubGoalKind,
    pub reason: String,
    /// Deep copy of the parent cycle's query.
    pub query: Query,
    pub strategy_hint: StrategyId,
    pub created_at: DateTime<Utc>,
}

impl SubGoal {
    pub fn new(
        kind: SubGoalKind,
        reason: impl Into<String>,
        query: Query,
        strategy_hint: StrategyId,
    ) -> Self {
        Self {
            kind,
            reason: reason.into(),
            query,
            strategy_hint,
            created_at: Utc::now(),
        }
    }
}
