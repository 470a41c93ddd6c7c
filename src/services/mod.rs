//! Core services of the Noesis reasoning engine.

pub mod cognitive_cycle;
pub mod config;
pub mod free_energy;
pub mod gap_resolver;
pub mod impasse;
pub mod orchestrator;
pub mod snapshot;
pub mod state_monitor;
pub mod strategy_registry;
pub mod template_store;
pub mod utility;

pub use cognitive_cycle::{CancelFlag, CognitiveCycle, CycleDeps};
pub use config::{
    Config, ConfigError, CycleConfig, FreeEnergyConfig, HistoryConfig, LoggingConfig,
    MonitorConfig, PersistenceConfig, RegistryConfig, ResolverConfig,
};
pub use free_energy::{Evaluation, FreeEnergyOptimizer};
pub use gap_resolver::{spawn_periodic, GapResolver, SweepLoopHandle, SweepReport};
pub use impasse::{ImpasseDetector, SubGoalFactory};
pub use orchestrator::{HrcOrchestrator, OrchestratorStats, PendingResolution};
pub use snapshot::CoreSnapshot;
pub use state_monitor::{AdaptationTrigger, StateMonitor, StressContributor, StressInput};
pub use strategy_registry::{PriorsSnapshot, RegistryEntry, StrategyRegistry};
pub use template_store::{TemplateSnapshot, TemplateStore, TemplateVersionId};
pub use utility::UtilityEvaluator;
