//! Domain models for the Noesis reasoning core.

pub mod candidate;
pub mod cycle;
pub mod impasse;
pub mod knowledge;
pub mod query;
pub mod strategy;
pub mod template;

pub use candidate::{FreeEnergyWeights, ScoredCandidate, SolutionCandidate};
pub use cycle::{CycleId, CycleOutcome, CycleRecord, CycleStatus, IterationResult};
pub use impasse::{Impasse, SubGoal, SubGoalKind};
pub use knowledge::{Concept, ContextFractal, Gap};
pub use query::{CycleContext, Query, QueryClass};
pub use strategy::{Strategy, StrategyId, StrategyStats};
pub use template::{EvolutionAnalysis, EvolutionReason, PromptTemplate};
