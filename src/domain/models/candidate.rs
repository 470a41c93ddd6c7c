//! Solution candidate model for free-energy scoring.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A candidate solution offered for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionCandidate {
    /// Textual payload the lexicon scoring runs over.
    pub text: String,
    /// Optional structured payload carried alongside.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
}

impl SolutionCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured = Some(value);
        self
    }

    /// Whitespace token count of the payload.
    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl From<&str> for SolutionCandidate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A candidate together with its component scores and composite free energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: SolutionCandidate,
    /// Structured entropy S of the containing set.
    pub entropy: f64,
    /// Coherence I of the containing set.
    pub coherence: f64,
    /// Per-candidate cost C.
    pub cost: f64,
    /// Per-candidate novelty N.
    pub novelty: f64,
    /// Composite G = -alpha*S + beta*I + gamma*C - delta*N.
    pub free_energy: f64,
}

/// Weights for the composite free-energy formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeEnergyWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

impl Default for FreeEnergyWeights {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            beta: 0.3,
            gamma: 0.2,
            delta: 0.1,
        }
    }
}

impl FreeEnergyWeights {
    /// The attainable range of G given these weights: [-alpha-delta, beta+gamma].
    pub fn bounds(&self) -> (f64, f64) {
        (-self.alpha - self.delta, self.beta + self.gamma)
    }

    /// Compose the component scores into G.
    pub fn compose(&self, entropy: f64, coherence: f64, cost: f64, novelty: f64) -> f64 {
        -self.alpha * entropy + self.beta * coherence + self.gamma * cost - self.delta * novelty
    }
}
