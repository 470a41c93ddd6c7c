//! Durable snapshots of the core's logical state.
//!
//! The core is stateful in memory; when a persistence collaborator is
//! wired, these records are what it stores: strategy priors, template
//! versions, the resolver's gap/context/concept maps, and the recent
//! evaluation history. Snapshots round-trip losslessly through JSON.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::HrcResult;
use crate::services::free_energy::{Evaluation, FreeEnergyOptimizer};
use crate::services::gap_resolver::{GapResolver, ResolverSnapshot};
use crate::services::state_monitor::StateMonitor;
use crate::services::strategy_registry::{PriorsSnapshot, StrategyRegistry};
use crate::services::template_store::{TemplateSnapshot, TemplateStore};

/// All logical records a persistence collaborator is expected to hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreSnapshot {
    pub strategy_priors: PriorsSnapshot,
    pub template_versions: TemplateSnapshot,
    pub resolver: ResolverSnapshot,
    pub evaluation_history: Vec<Evaluation>,
    pub free_energy: f64,
    pub taken_at: DateTime<Utc>,
}

impl CoreSnapshot {
    /// Capture the current state of the given services.
    pub async fn capture(
        registry: &StrategyRegistry,
        templates: &TemplateStore,
        optimizer: &FreeEnergyOptimizer,
        monitor: &StateMonitor,
        resolver: &GapResolver,
    ) -> Self {
        Self {
            strategy_priors: registry.snapshot().await,
            template_versions: templates.snapshot().await,
            resolver: resolver.export().await,
            evaluation_history: optimizer.history().await,
            free_energy: monitor.free_energy().await,
            taken_at: Utc::now(),
        }
    }

    /// Apply the restorable parts of the snapshot back onto live services.
    /// Evaluation history and the free-energy scalar are observational and
    /// are not replayed.
    pub async fn apply(
        self,
        registry: &StrategyRegistry,
        templates: &TemplateStore,
        resolver: &GapResolver,
    ) -> HrcResult<()> {
        registry.restore(self.strategy_priors).await?;
        templates.restore(self.template_versions).await?;
        resolver.restore(self.resolver).await;
        Ok(())
    }

    /// Write the snapshot as pretty JSON.
    pub async fn save(&self, path: &Path) -> HrcResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Read a snapshot back from disk.
    pub async fn load(path: &Path) -> HrcResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
