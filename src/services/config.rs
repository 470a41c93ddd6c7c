//! Configuration for the Noesis reasoning core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::candidate::FreeEnergyWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
    #[error("Validation failed for {field}: {reason}")]
    ValidationError { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cycle: CycleConfig,
    pub registry: RegistryConfig,
    pub free_energy: FreeEnergyConfig,
    pub monitor: MonitorConfig,
    pub resolver: ResolverConfig,
    pub history: HistoryConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle: CycleConfig::default(),
            registry: RegistryConfig::default(),
            free_energy: FreeEnergyConfig::default(),
            monitor: MonitorConfig::default(),
            resolver: ResolverConfig::default(),
            history: HistoryConfig::default(),
            persistence: PersistenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validate cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle.max_iterations == 0 {
            return Err(ConfigError::ValidationError {
                field: "cycle.max_iterations".into(),
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.cycle.theta_success) {
            return Err(ConfigError::ValidationError {
                field: "cycle.theta_success".into(),
                reason: "must be in [0, 1]".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.cycle.theta_disc) {
            return Err(ConfigError::ValidationError {
                field: "cycle.theta_disc".into(),
                reason: "must be in [0, 1]".into(),
            });
        }
        if self.cycle.theta_disc > self.cycle.theta_success {
            return Err(ConfigError::ValidationError {
                field: "cycle.theta_disc".into(),
                reason: "must not exceed theta_success".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.registry.learning_rate) {
            return Err(ConfigError::ValidationError {
                field: "registry.learning_rate".into(),
                reason: "must be in [0, 1]".into(),
            });
        }
        if self.cycle.subgoal_queue_depth == 0 {
            return Err(ConfigError::ValidationError {
                field: "cycle.subgoal_queue_depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Budgets and thresholds for one cognitive cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Hard iteration budget per cycle.
    pub max_iterations: u32,
    /// Wall-clock budget per cycle, in seconds.
    pub cycle_timeout_secs: u64,
    /// Confidence above which an iteration is accepted as the outcome.
    pub theta_success: f64,
    /// Confidence below which the generative kernel is consulted.
    pub theta_disc: f64,
    /// Pending sub-goal queue depth per cycle.
    pub subgoal_queue_depth: usize,
    /// Results requested per memory search.
    pub search_top_k: usize,
    /// Similarity floor passed to semantic search.
    pub min_similarity: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            cycle_timeout_secs: 30,
            theta_success: 0.8,
            theta_disc: 0.3,
            subgoal_queue_depth: 16,
            search_top_k: 5,
            min_similarity: 0.1,
        }
    }
}

impl CycleConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cycle_timeout_secs)
    }
}

/// Strategy registry tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Moving-average rate applied to expected-success updates.
    pub learning_rate: f64,
    /// Penalty subtracted from an implicated strategy's prior on adaptation.
    pub adaptation_penalty: f64,
    /// Fraction of the distance back toward seed priors applied on
    /// adaptation decay.
    pub decay_rate: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            adaptation_penalty: 0.1,
            decay_rate: 0.25,
        }
    }
}

/// Free-energy optimizer weights and history bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeEnergyConfig {
    pub weights: FreeEnergyWeights,
    /// Evaluation history ring-buffer depth.
    pub history_depth: usize,
}

impl Default for FreeEnergyConfig {
    fn default() -> Self {
        Self {
            weights: FreeEnergyWeights::default(),
            history_depth: 10_000,
        }
    }
}

/// System state monitor thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Free-energy level above which adaptation triggers fire.
    pub upper_bound: f64,
    /// Passive decay applied to F on every integration step.
    pub decay: f64,
    /// Adaptation history depth.
    pub history_depth: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            upper_bound: 10.0,
            decay: 0.05,
            history_depth: 256,
        }
    }
}

/// Gap resolver sources and cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Roadmap source path (file or directory of concept seeds).
    pub roadmap_path: Option<String>,
    /// Context corpus path (directory of ingestible documents).
    pub context_path: Option<String>,
    /// Periodic sweep interval, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            roadmap_path: None,
            context_path: None,
            sweep_interval_secs: 300,
        }
    }
}

/// Bounds on the orchestrator's in-memory histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Completed-cycle history depth.
    pub cycle_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { cycle_depth: 1024 }
    }
}

/// Optional durable event sink.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// JSON-lines event log path. Absent means events are dropped.
    pub event_log_path: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
    /// Log format: json, pretty.
    pub format: String,
    /// Optional directory for daily-rolling log files.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
            directory: None,
        }
    }
}
