//! Utility evaluation for strategy selection.
//!
//! U = P * G - C, with query-class adjustments applied to P before the
//! product. The evaluator is a pure function of (strategy, query class):
//! the same inputs always select the same strategy.

use crate::domain::models::query::QueryClass;
use crate::domain::models::strategy::{Strategy, StrategyId};

/// Stateless utility evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtilityEvaluator;

impl UtilityEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Adjusted expected success for the query class, clamped to [0, 1].
    fn adjusted_success(strategy: &Strategy, class: QueryClass) -> f64 {
        let bonus = match (class, strategy.id) {
            (QueryClass::ComplexMultiHop, StrategyId::LlmDecomposition) => 0.2,
            (QueryClass::DoesNotUnderstand, StrategyId::VsaNative) => 0.1,
            _ => 0.0,
        };
        (strategy.expected_success + bonus).clamp(0.0, 1.0)
    }

    /// Score one strategy against a query class.
    pub fn score(&self, strategy: &Strategy, class: QueryClass) -> f64 {
        Self::adjusted_success(strategy, class) * strategy.goal_value - strategy.expected_cost
    }

    /// Select the highest-utility strategy. Ties break by lowest expected
    /// cost, then lexical id.
    pub fn select(&self, strategies: &[Strategy], class: QueryClass) -> Option<StrategyId> {
        strategies
            .iter()
            .map(|s| (self.score(s, class), s))
            .max_by(|(ua, a), (ub, b)| {
                ua.partial_cmp(ub)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // tie: prefer the cheaper strategy, then the lexically
                    // smaller id (max_by keeps the later "greater" element)
                    .then_with(|| {
                        b.expected_cost
                            .partial_cmp(&a.expected_cost)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| b.id.as_str().cmp(a.id.as_str()))
            })
            .map(|(_, s)| s.id)
    }
}
