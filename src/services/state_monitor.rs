//! System state monitor: running free-energy tracking and adaptation
//! dispatch.
//!
//! The monitor folds cycle outcomes, candidate-scoring results, and
//! exogenous stress readings into a single nonnegative scalar F. When F
//! crosses the configured upper bound, an adaptation trigger names the
//! dominant contributor; applying an adaptation always lowers F.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::models::cycle::CycleOutcome;
use crate::domain::models::strategy::StrategyId;
use crate::services::config::MonitorConfig;

/// Contribution weights for the free-energy integration.
const FAILURE_CONTRIBUTION: f64 = 1.0;
const SUCCESS_RELIEF: f64 = 0.5;
const SCORE_CONTRIBUTION: f64 = 0.5;
const STRESS_CONTRIBUTION: f64 = 2.0;
/// Fraction of F discharged when an adaptation is applied.
const ADAPTATION_RELIEF: f64 = 0.5;

/// The stress dimension dominating an adaptation trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressContributor {
    CycleFailures,
    CandidateScoring,
    CognitiveLoad,
    MemoryPressure,
    ErrorRate,
}

impl StressContributor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycleFailures => "cycle_failures",
            Self::CandidateScoring => "candidate_scoring",
            Self::CognitiveLoad => "cognitive_load",
            Self::MemoryPressure => "memory_pressure",
            Self::ErrorRate => "error_rate",
        }
    }
}

/// Exogenous stress reading, all components in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StressInput {
    pub cognitive_load: f64,
    pub memory_pressure: f64,
    pub error_rate: f64,
}

impl StressInput {
    fn clamped(self) -> Self {
        Self {
            cognitive_load: self.cognitive_load.clamp(0.0, 1.0),
            memory_pressure: self.memory_pressure.clamp(0.0, 1.0),
            error_rate: self.error_rate.clamp(0.0, 1.0),
        }
    }

    fn dominant(self) -> StressContributor {
        let pairs = [
            (self.cognitive_load, StressContributor::CognitiveLoad),
            (self.memory_pressure, StressContributor::MemoryPressure),
            (self.error_rate, StressContributor::ErrorRate),
        ];
        pairs
            .into_iter()
            .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map_or(StressContributor::CognitiveLoad, |(_, c)| c)
    }
}

/// Raised when F crosses the upper bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationTrigger {
    pub dominant: StressContributor,
    /// Strategy implicated by the triggering observation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicated_strategy: Option<StrategyId>,
    /// F at trigger time.
    pub free_energy: f64,
    pub triggered_at: DateTime<Utc>,
}

/// One entry in the bounded adaptation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationEntry {
    pub trigger: AdaptationTrigger,
    /// F after the adaptation was applied.
    pub free_energy_after: f64,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug)]
struct MonitorState {
    free_energy: f64,
    recent_failures: f64,
    recent_score_pressure: f64,
    last_stress: StressInput,
    history: VecDeque<AdaptationEntry>,
    pending: Option<AdaptationTrigger>,
}

/// Shared free-energy state monitor. Re-entrant safe: all state sits behind
/// one async mutex and every public method is a single critical section.
#[derive(Debug, Clone)]
pub struct StateMonitor {
    config: MonitorConfig,
    state: Arc<Mutex<MonitorState>>,
}

impl StateMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(MonitorState {
                free_energy: 0.0,
                recent_failures: 0.0,
                recent_score_pressure: 0.0,
                last_stress: StressInput::default(),
                history: VecDeque::new(),
                pending: None,
            })),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MonitorConfig::default())
    }

    /// Current free-energy scalar F. Always finite and nonnegative.
    pub async fn free_energy(&self) -> f64 {
        self.state.lock().await.free_energy
    }

    /// Fold a completed cycle into F. Failures raise F; successes give
    /// relief. Returns a trigger when F crosses the upper bound.
    pub async fn integrate_outcome(&self, outcome: &CycleOutcome) -> Option<AdaptationTrigger> {
        let mut state = self.state.lock().await;
        if outcome.success {
            state.free_energy = (state.free_energy - SUCCESS_RELIEF).max(0.0);
            state.recent_failures = (state.recent_failures - 0.5).max(0.0);
        } else {
            state.free_energy += FAILURE_CONTRIBUTION;
            state.recent_failures += 1.0;
        }
        Self::settle(&mut state, self.config.decay);
        self.check_bound(&mut state, Some(outcome.strategy))
    }

    /// Fold a candidate-scoring result into F. Positive free energies (poor
    /// candidate sets) add pressure.
    pub async fn integrate_score(&self, free_energy: f64) -> Option<AdaptationTrigger> {
        if !free_energy.is_finite() {
            warn!(free_energy, "ignoring non-finite candidate score");
            return None;
        }
        let mut state = self.state.lock().await;
        if free_energy > 0.0 {
            state.free_energy += SCORE_CONTRIBUTION * free_energy;
            state.recent_score_pressure += free_energy;
        }
        Self::settle(&mut state, self.config.decay);
        self.check_bound(&mut state, None)
    }

    /// Fold an exogenous stress reading into F.
    pub async fn integrate_stress(&self, stress: StressInput) -> Option<AdaptationTrigger> {
        let stress = stress.clamped();
        let mut state = self.state.lock().await;
        let load = stress.cognitive_load + stress.memory_pressure + stress.error_rate;
        state.free_energy += STRESS_CONTRIBUTION * load / 3.0;
        state.last_stress = stress;
        Self::settle(&mut state, self.config.decay);
        self.check_bound(&mut state, None)
    }

    /// Mark the pending adaptation as applied, discharging part of F.
    /// Adaptation never raises F.
    pub async fn adaptation_applied(&self) {
        let mut state = self.state.lock().await;
        let Some(trigger) = state.pending.take() else {
            return;
        };
        state.free_energy *= 1.0 - ADAPTATION_RELIEF;
        state.recent_failures = 0.0;
        state.recent_score_pressure = 0.0;
        let entry = AdaptationEntry {
            trigger,
            free_energy_after: state.free_energy,
            applied_at: Utc::now(),
        };
        if state.history.len() == self.config.history_depth {
            state.history.pop_front();
        }
        state.history.push_back(entry);
        debug!(free_energy = state.free_energy, "adaptation applied");
    }

    /// Bounded adaptation history, oldest first.
    pub async fn adaptation_history(&self) -> Vec<AdaptationEntry> {
        self.state.lock().await.history.iter().cloned().collect()
    }

    fn settle(state: &mut MonitorState, decay: f64) {
        state.free_energy = ((state.free_energy) * (1.0 - decay)).max(0.0);
        debug_assert!(state.free_energy.is_finite());
    }

    fn check_bound(
        &self,
        state: &mut MonitorState,
        implicated: Option<StrategyId>,
    ) -> Option<AdaptationTrigger> {
        if state.free_energy <= self.config.upper_bound || state.pending.is_some() {
            return None;
        }
        let dominant = if state.recent_failures >= state.recent_score_pressure {
            if state.recent_failures > 0.0 {
                StressContributor::CycleFailures
            } else {
                state.last_stress.dominant()
            }
        } else {
            StressContributor::CandidateScoring
        };
        let trigger = AdaptationTrigger {
            dominant,
            implicated_strategy: implicated,
            free_energy: state.free_energy,
            triggered_at: Utc::now(),
        };
        warn!(
            free_energy = state.free_energy,
            dominant = dominant.as_str(),
            "free energy crossed upper bound"
        );
        state.pending = Some(trigger.clone());
        Some(trigger)
    }
}
