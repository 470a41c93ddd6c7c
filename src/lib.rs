//! Noesis - Hierarchical Reflective Cognition Orchestrator
//!
//! A reasoning engine that resolves queries (and unresolved message
//! dispatches from a host object system) by running bounded iterative
//! cognitive cycles with:
//! - Utility-driven strategy selection over an evolving registry
//! - Impasse detection and in-line sub-goal resolution
//! - Composite free-energy scoring of candidate solutions
//! - Prompt-template autopoiesis driven by outcome history
//! - A progressive gap resolver feeding evolved concepts back in

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export key types for convenience
pub use domain::errors::{ErrorKind, HrcError, HrcResult};
pub use domain::models::cycle::{CycleId, CycleOutcome, CycleStatus};
pub use domain::models::query::{CycleContext, Query, QueryClass};
pub use services::config::Config;
pub use services::orchestrator::{HrcOrchestrator, PendingResolution};
