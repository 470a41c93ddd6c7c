//! Strategy registry: the catalog of reasoning strategies and their
//! evolving priors.
//!
//! Priors are seeded at init. Expected success is adjusted by a bounded
//! moving average as cycle outcomes arrive; expected cost and goal value
//! stay fixed unless an adaptation trigger alters them. Updates are
//! additive, so concurrent compositions commute.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::strategy::{Strategy, StrategyId, StrategyStats};
use crate::services::config::RegistryConfig;

/// A registry entry: current priors plus running statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub strategy: Strategy,
    pub stats: StrategyStats,
}

/// Serializable snapshot of all priors, for persistence round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorsSnapshot(pub BTreeMap<StrategyId, Strategy>);

/// Shared registry of reasoning strategies.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    entries: Arc<RwLock<BTreeMap<StrategyId, RegistryEntry>>>,
    config: RegistryConfig,
}

impl StrategyRegistry {
    /// Build a registry holding the seeded catalog.
    pub fn new(config: RegistryConfig) -> Self {
        let entries = Strategy::seed_catalog()
            .into_iter()
            .map(|strategy| {
                (
                    strategy.id,
                    RegistryEntry {
                        strategy,
                        stats: StrategyStats::default(),
                    },
                )
            })
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RegistryConfig::default())
    }

    /// List all strategies with their current priors.
    pub async fn list(&self) -> Vec<Strategy> {
        let entries = self.entries.read().await;
        entries.values().map(|e| e.strategy.clone()).collect()
    }

    /// Look up one strategy.
    pub async fn get(&self, id: StrategyId) -> HrcResult<Strategy> {
        let entries = self.entries.read().await;
        entries
            .get(&id)
            .map(|e| e.strategy.clone())
            .ok_or_else(|| HrcError::Integrity(format!("strategy not in registry: {id}")))
    }

    /// Record a cycle outcome for the strategy that drove it.
    ///
    /// Expected success moves toward the observed outcome by the configured
    /// learning rate and stays clamped to [0, 1].
    pub async fn update_stats(&self, id: StrategyId, success: bool) -> HrcResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| HrcError::Integrity(format!("strategy not in registry: {id}")))?;

        let observed = if success { 1.0 } else { 0.0 };
        let p = entry.strategy.expected_success;
        entry.strategy.expected_success =
            (p + self.config.learning_rate * (observed - p)).clamp(0.0, 1.0);
        entry.stats.record(success);

        debug!(
            strategy = %id,
            success,
            expected_success = entry.strategy.expected_success,
            "updated strategy prior"
        );
        Ok(())
    }

    /// Apply an adaptation penalty to the implicated strategy's prior.
    pub async fn apply_penalty(&self, id: StrategyId) -> HrcResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| HrcError::Integrity(format!("strategy not in registry: {id}")))?;
        entry.strategy.expected_success =
            (entry.strategy.expected_success - self.config.adaptation_penalty).clamp(0.0, 1.0);
        Ok(())
    }

    /// Decay every prior part of the way back toward its seed value.
    pub async fn decay_toward_seed(&self) {
        let seeds: BTreeMap<StrategyId, Strategy> = Strategy::seed_catalog()
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let mut entries = self.entries.write().await;
        for (id, entry) in entries.iter_mut() {
            if let Some(seed) = seeds.get(id) {
                let p = entry.strategy.expected_success;
                entry.strategy.expected_success =
                    (p + self.config.decay_rate * (seed.expected_success - p)).clamp(0.0, 1.0);
            }
        }
    }

    /// Running statistics per strategy.
    pub async fn stats(&self) -> BTreeMap<StrategyId, StrategyStats> {
        let entries = self.entries.read().await;
        entries.iter().map(|(id, e)| (*id, e.stats.clone())).collect()
    }

    /// Snapshot the current priors.
    pub async fn snapshot(&self) -> PriorsSnapshot {
        let entries = self.entries.read().await;
        PriorsSnapshot(
            entries
                .iter()
                .map(|(id, e)| (*id, e.strategy.clone()))
                .collect(),
        )
    }

    /// Restore priors from a snapshot. Unknown strategies in the snapshot
    /// are an integrity error.
    pub async fn restore(&self, snapshot: PriorsSnapshot) -> HrcResult<()> {
        let mut entries = self.entries.write().await;
        for (id, strategy) in snapshot.0 {
            let entry = entries
                .get_mut(&id)
                .ok_or_else(|| HrcError::Integrity(format!("strategy not in registry: {id}")))?;
            entry.strategy = Strategy::new(
                id,
                strategy.display_name,
                strategy.expected_success,
                strategy.expected_cost,
                strategy.goal_value,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_four_strategies() {
        let registry = StrategyRegistry::with_defaults();
        let strategies = registry.list().await;
        assert_eq!(strategies.len(), 4);
        assert!(registry.get(StrategyId::VsaNative).await.is_ok());
    }

    #[tokio::test]
    async fn update_moves_prior_toward_outcome() {
        let registry = StrategyRegistry::new(RegistryConfig {
            learning_rate: 0.1,
            ..RegistryConfig::default()
        });

        registry.update_stats(StrategyId::VsaNative, true).await.unwrap();
        let s = registry.get(StrategyId::VsaNative).await.unwrap();
        // 0.7 + 0.1 * (1.0 - 0.7) = 0.73
        assert!((s.expected_success - 0.73).abs() < 1e-9);

        registry.update_stats(StrategyId::VsaNative, false).await.unwrap();
        let s = registry.get(StrategyId::VsaNative).await.unwrap();
        // 0.73 + 0.1 * (0.0 - 0.73) = 0.657
        assert!((s.expected_success - 0.657).abs() < 1e-9);
    }

    #[tokio::test]
    async fn priors_stay_bounded_under_many_updates() {
        let registry = StrategyRegistry::with_defaults();
        for _ in 0..200 {
            registry.update_stats(StrategyId::GlobalSearch, true).await.unwrap();
        }
        let s = registry.get(StrategyId::GlobalSearch).await.unwrap();
        assert!(s.expected_success <= 1.0);

        for _ in 0..200 {
            registry.update_stats(StrategyId::GlobalSearch, false).await.unwrap();
        }
        let s = registry.get(StrategyId::GlobalSearch).await.unwrap();
        assert!(s.expected_success >= 0.0);
    }

    #[tokio::test]
    async fn cost_and_goal_value_stay_fixed_on_update() {
        let registry = StrategyRegistry::with_defaults();
        registry.update_stats(StrategyId::LlmDecomposition, false).await.unwrap();
        let s = registry.get(StrategyId::LlmDecomposition).await.unwrap();
        assert!((s.expected_cost - 0.8).abs() < f64::EPSILON);
        assert!((s.goal_value - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn penalty_and_decay() {
        let registry = StrategyRegistry::new(RegistryConfig {
            learning_rate: 0.1,
            adaptation_penalty: 0.2,
            decay_rate: 0.5,
        });

        registry.apply_penalty(StrategyId::VsaNative).await.unwrap();
        let s = registry.get(StrategyId::VsaNative).await.unwrap();
        assert!((s.expected_success - 0.5).abs() < 1e-9);

        registry.decay_toward_seed().await;
        let s = registry.get(StrategyId::VsaNative).await.unwrap();
        // halfway back from 0.5 to the 0.7 seed
        assert!((s.expected_success - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn snapshot_roundtrip() {
        let registry = StrategyRegistry::with_defaults();
        registry.update_stats(StrategyId::VsaNative, true).await.unwrap();
        let snapshot = registry.snapshot().await;

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PriorsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);

        let other = StrategyRegistry::with_defaults();
        other.restore(back).await.unwrap();
        assert_eq!(other.snapshot().await, snapshot);
    }

    #[tokio::test]
    async fn stats_record_attempts() {
        let registry = StrategyRegistry::with_defaults();
        registry.update_stats(StrategyId::VsaNative, true).await.unwrap();
        registry.update_stats(StrategyId::VsaNative, false).await.unwrap();
        let stats = registry.stats().await;
        let vsa = &stats[&StrategyId::VsaNative];
        assert_eq!(vsa.attempts, 2);
        assert_eq!(vsa.successes, 1);
    }
}
