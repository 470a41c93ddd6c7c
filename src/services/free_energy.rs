//! Composite free-energy optimizer.
//!
//! Scores candidate solution sets with a Gibbs-style composite
//! G = -alpha*S + beta*I + gamma*C - delta*N, where S is the structured
//! entropy of the set, I its pairwise coherence, and C/N the per-candidate
//! cost and novelty. Selection minimizes G. Every evaluation lands in a
//! bounded ring buffer so adaptation can inspect recent scoring pressure.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::trace;

use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::candidate::{FreeEnergyWeights, ScoredCandidate, SolutionCandidate};
use crate::services::config::FreeEnergyConfig;

/// Approach signatures recognized by the structured-entropy measure.
const APPROACH_LEXICON: [&str; 16] = [
    "modular",
    "hierarchical",
    "distributed",
    "centralized",
    "parallel",
    "sequential",
    "recursive",
    "iterative",
    "functional",
    "procedural",
    "declarative",
    "imperative",
    "reactive",
    "proactive",
    "adaptive",
    "static",
];

/// Design concepts used by the coherence measure.
const DESIGN_LEXICON: [&str; 8] = [
    "system",
    "interface",
    "data",
    "process",
    "user",
    "performance",
    "security",
    "scalability",
];

/// Terms indicating implementation complexity, feeding the cost measure.
const COMPLEXITY_LEXICON: [&str; 8] = [
    "algorithm",
    "optimization",
    "parallel",
    "distributed",
    "neural",
    "learning",
    "search",
    "index",
];

/// Primary novelty markers (weighted 0.15 each).
const NOVELTY_LEXICON: [&str; 8] = [
    "novel",
    "innovative",
    "creative",
    "unique",
    "breakthrough",
    "pioneering",
    "revolutionary",
    "experimental",
];

/// Domain-specific novelty markers (weighted 0.10 each).
const NOVELTY_DOMAIN_LEXICON: [&str; 7] = [
    "fractal",
    "consciousness",
    "entropy",
    "autopoietic",
    "prototypal",
    "morphic",
    "synaptic",
];

/// Token-count boundaries for the structural classes {low, med, high}.
const STRUCTURAL_MED_TOKENS: usize = 20;
const STRUCTURAL_HIGH_TOKENS: usize = 60;

/// One recorded evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub candidate_count: usize,
    pub selected_index: Option<usize>,
    pub best_free_energy: f64,
    pub evaluated_at: DateTime<Utc>,
}

/// The composite free-energy optimizer.
#[derive(Debug, Clone)]
pub struct FreeEnergyOptimizer {
    weights: FreeEnergyWeights,
    history_depth: usize,
    history: Arc<RwLock<VecDeque<Evaluation>>>,
}

impl FreeEnergyOptimizer {
    pub fn new(config: FreeEnergyConfig) -> Self {
        Self {
            weights: config.weights,
            history_depth: config.history_depth.max(1),
            history: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FreeEnergyConfig::default())
    }

    pub fn weights(&self) -> FreeEnergyWeights {
        self.weights
    }

    /// Structured entropy S(K) of a candidate set, in [0, 1]: distinct
    /// approach signatures plus distinct structural classes, over 2|K|.
    pub fn structured_entropy(candidates: &[SolutionCandidate]) -> f64 {
        if candidates.is_empty() {
            return 0.0;
        }
        let mut approaches: HashSet<&str> = HashSet::new();
        let mut classes: HashSet<&str> = HashSet::new();
        for candidate in candidates {
            let lower = candidate.text.to_lowercase();
            for term in APPROACH_LEXICON {
                if lower.contains(term) {
                    approaches.insert(term);
                }
            }
            classes.insert(Self::structural_class(candidate));
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = (approaches.len() + classes.len()) as f64 / (2 * candidates.len()) as f64;
        ratio.clamp(0.0, 1.0)
    }

    /// Structural class by payload size.
    fn structural_class(candidate: &SolutionCandidate) -> &'static str {
        let tokens = candidate.token_count();
        if tokens < STRUCTURAL_MED_TOKENS {
            "low"
        } else if tokens < STRUCTURAL_HIGH_TOKENS {
            "med"
        } else {
            "high"
        }
    }

    /// Coherence I(K) in [0, 1]: fraction of unordered pairs sharing at
    /// least one design-lexicon term. A singleton set is fully coherent.
    pub fn coherence(candidates: &[SolutionCandidate]) -> f64 {
        if candidates.is_empty() {
            return 0.0;
        }
        if candidates.len() == 1 {
            return 1.0;
        }
        let term_sets: Vec<HashSet<&str>> = candidates
            .iter()
            .map(|c| {
                let lower = c.text.to_lowercase();
                DESIGN_LEXICON
                    .iter()
                    .copied()
                    .filter(|t| lower.contains(t))
                    .collect()
            })
            .collect();

        let mut sharing = 0usize;
        let mut pairs = 0usize;
        for i in 0..term_sets.len() {
            for j in i + 1..term_sets.len() {
                pairs += 1;
                if !term_sets[i].is_disjoint(&term_sets[j]) {
                    sharing += 1;
                }
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = sharing as f64 / pairs as f64;
        ratio
    }

    /// Cost C(k) in [0, 1]: token load plus complexity-term matches,
    /// capped at 1.
    pub fn cost(candidate: &SolutionCandidate) -> f64 {
        let lower = candidate.text.to_lowercase();
        let complexity_matches = COMPLEXITY_LEXICON
            .iter()
            .filter(|t| lower.contains(*t))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let raw = candidate.token_count() as f64 / 100.0 + 0.1 * complexity_matches as f64;
        raw.min(1.0)
    }

    /// Novelty N(k) in [0, 1]: 0.15 per primary marker plus 0.10 per
    /// domain marker, capped at 1.
    pub fn novelty(candidate: &SolutionCandidate) -> f64 {
        let lower = candidate.text.to_lowercase();
        let primary = NOVELTY_LEXICON.iter().filter(|t| lower.contains(*t)).count();
        let domain = NOVELTY_DOMAIN_LEXICON
            .iter()
            .filter(|t| lower.contains(*t))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let raw = 0.15 * primary as f64 + 0.10 * domain as f64;
        raw.min(1.0)
    }

    /// Score one candidate against its containing set. Scoring is pure:
    /// identical inputs yield identical G.
    pub fn score_one(
        &self,
        candidate: &SolutionCandidate,
        set: &[SolutionCandidate],
    ) -> ScoredCandidate {
        let entropy = Self::structured_entropy(set);
        let coherence = Self::coherence(set);
        let cost = Self::cost(candidate);
        let novelty = Self::novelty(candidate);
        let free_energy = self.weights.compose(entropy, coherence, cost, novelty);
        ScoredCandidate {
            candidate: candidate.clone(),
            entropy,
            coherence,
            cost,
            novelty,
            free_energy,
        }
    }

    /// Score every candidate in a set.
    pub fn score_set(&self, set: &[SolutionCandidate]) -> Vec<ScoredCandidate> {
        set.iter().map(|c| self.score_one(c, set)).collect()
    }

    /// Select the minimum-G candidate. Ties break by lowest cost, then
    /// earliest index. An empty set is an invalid input.
    pub async fn select(&self, set: &[SolutionCandidate]) -> HrcResult<(usize, ScoredCandidate)> {
        if set.is_empty() {
            return Err(HrcError::Invalid("empty candidate set".into()));
        }
        let scored = self.score_set(set);
        let mut best = 0usize;
        for (i, candidate) in scored.iter().enumerate().skip(1) {
            let current = &scored[best];
            let better = candidate.free_energy < current.free_energy
                || (candidate.free_energy == current.free_energy
                    && candidate.cost < current.cost);
            if better {
                best = i;
            }
        }

        self.record(Evaluation {
            candidate_count: set.len(),
            selected_index: Some(best),
            best_free_energy: scored[best].free_energy,
            evaluated_at: Utc::now(),
        })
        .await;

        trace!(
            candidates = set.len(),
            selected = best,
            free_energy = scored[best].free_energy,
            "selected candidate"
        );
        Ok((best, scored[best].clone()))
    }

    async fn record(&self, evaluation: Evaluation) {
        let mut history = self.history.write().await;
        if history.len() == self.history_depth {
            history.pop_front();
        }
        history.push_back(evaluation);
    }

    /// Recent evaluations, oldest first.
    pub async fn history(&self) -> Vec<Evaluation> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Mean of the recently selected free energies, if any evaluations ran.
    pub async fn recent_mean_free_energy(&self) -> Option<f64> {
        let history = self.history.read().await;
        if history.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(history.iter().map(|e| e.best_free_energy).sum::<f64>() / history.len() as f64)
    }
}
