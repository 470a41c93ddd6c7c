//! Cognitive cycle domain model.
//!
//! A cycle is one bounded iterative reasoning attempt for one query. It is
//! owned by the orchestrator: created on submit, archived on completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::query::{CycleContext, Query};
use super::strategy::StrategyId;
use crate::domain::errors::ErrorKind;

/// Unique identifier for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CycleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Status of a cycle in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Created but not yet started.
    Initialized,
    /// Iterating. Only this state may mutate iteration state.
    Running,
    /// Reached an accepted outcome.
    Completed,
    /// Wall-clock budget exceeded.
    TimedOut,
    /// Failed (max iterations, sub-goal overflow, cancellation, integrity).
    Failed,
}

impl Default for CycleStatus {
    fn default() -> Self {
        Self::Initialized
    }
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }

    /// Check if this is a terminal state. Terminal cycles are frozen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::Failed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> &'static [CycleStatus] {
        match self {
            Self::Initialized => &[Self::Running, Self::Failed],
            Self::Running => &[Self::Completed, Self::TimedOut, Self::Failed],
            Self::Completed | Self::TimedOut | Self::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Result of one iteration inside a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationResult {
    /// Confidence in [0, 1] produced by the strategy execution.
    pub confidence: f64,
    /// Number of similar candidates the strategy surfaced.
    pub similar_count: usize,
    /// Best-match payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<Value>,
    /// Whether the generative kernel synthesized this result.
    pub used_generation: bool,
    /// Strategy that produced the result.
    pub strategy: StrategyId,
    /// Strategy-specific evidence.
    #[serde(default)]
    pub evidence: Map<String, Value>,
    /// Whether the strategy selected an operator at all.
    pub operator_selected: bool,
    /// Failure raised by the selected operator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl IterationResult {
    pub fn empty(strategy: StrategyId) -> Self {
        Self {
            confidence: 0.0,
            similar_count: 0,
            best_match: None,
            used_generation: false,
            strategy,
            evidence: Map::new(),
            operator_selected: false,
            failure: None,
        }
    }

    pub fn failed(strategy: StrategyId, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            operator_selected: true,
            ..Self::empty(strategy)
        }
    }
}

/// Terminal outcome of a cycle, surfaced to the submitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub success: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub used_generation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    pub iterations: u32,
    pub strategy: StrategyId,
}

impl CycleOutcome {
    pub fn success(result: &IterationResult, iterations: u32) -> Self {
        Self {
            success: true,
            confidence: result.confidence,
            result: result.best_match.clone(),
            used_generation: result.used_generation,
            error: None,
            error_reason: None,
            iterations,
            strategy: result.strategy,
        }
    }

    pub fn failure(
        kind: ErrorKind,
        reason: impl Into<String>,
        strategy: StrategyId,
        iterations: u32,
    ) -> Self {
        Self {
            success: false,
            confidence: 0.0,
            result: None,
            used_generation: false,
            error: Some(kind),
            error_reason: Some(reason.into()),
            iterations,
            strategy,
        }
    }
}

/// A cycle record as tracked by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub id: CycleId,
    pub query: Query,
    pub context: CycleContext,
    pub iterations: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: CycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_strategy: Option<StrategyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CycleOutcome>,
}

impl CycleRecord {
    pub fn new(id: CycleId, query: Query, context: CycleContext) -> Self {
        Self {
            id,
            query,
            context,
            iterations: 0,
            started_at: Utc::now(),
            ended_at: None,
            status: CycleStatus::Initialized,
            chosen_strategy: None,
            outcome: None,
        }
    }

    /// Seal the record with a terminal status and outcome. A terminal record
    /// is never mutated again.
    pub fn seal(&mut self, status: CycleStatus, outcome: CycleOutcome) {
        debug_assert!(status.is_terminal());
        if self.status.is_terminal() {
            return;
        }
        self.iterations = outcome.iterations;
        self.chosen_strategy = Some(outcome.strategy);
        self.status = status;
        self.outcome = Some(outcome);
        self.ended_at = Some(Utc::now());
    }
}
