//! Impasse detection and sub-goal construction.
//!
//! Detection classifies one iteration result into at most one impasse kind;
//! the factory maps each kind to the sub-goal template that attempts to
//! resolve it. Detection is deterministic and idempotent per result.

use crate::domain::models::cycle::IterationResult;
use crate::domain::models::impasse::{Impasse, SubGoal, SubGoalKind};
use crate::domain::models::query::Query;
use crate::domain::models::strategy::StrategyId;

/// Confidence below which an iteration counts as no state change.
const STATE_NO_CHANGE_CONFIDENCE: f64 = 0.1;
/// More than this many similar candidates counts as an operator tie.
const OPERATOR_TIE_CANDIDATES: usize = 3;

/// Stateless impasse detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpasseDetector;

impl ImpasseDetector {
    pub fn new() -> Self {
        Self
    }

    /// Classify an iteration result. Precedence: operator failure, then
    /// operator no-change, then state no-change, then operator tie.
    pub fn detect(&self, result: &IterationResult) -> Option<Impasse> {
        if let Some(reason) = &result.failure {
            return Some(Impasse::OperatorFailure {
                strategy: result.strategy,
                reason: reason.clone(),
            });
        }
        if !result.operator_selected {
            return Some(Impasse::OperatorNoChange {
                strategy: result.strategy,
            });
        }
        if result.confidence < STATE_NO_CHANGE_CONFIDENCE {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            return Some(Impasse::StateNoChange {
                confidence_millis: (result.confidence.max(0.0) * 1000.0).round() as u32,
            });
        }
        if result.similar_count > OPERATOR_TIE_CANDIDATES {
            return Some(Impasse::OperatorTie {
                candidates: result.similar_count,
            });
        }
        None
    }
}

/// Builds sub-goals keyed to impasse kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubGoalFactory;

impl SubGoalFactory {
    pub fn new() -> Self {
        Self
    }

    /// Produce the sub-goal template for an impasse. The query is
    /// deep-copied from the parent cycle; the strategy hint is always one
    /// of the registry strategies.
    pub fn build(&self, impasse: &Impasse, query: &Query) -> SubGoal {
        let (kind, hint) = match impasse {
            Impasse::StateNoChange { .. } => (SubGoalKind::Exploration, StrategyId::GlobalSearch),
            Impasse::OperatorTie { .. } => {
                (SubGoalKind::Disambiguation, StrategyId::GraphDisambiguation)
            }
            Impasse::OperatorNoChange { .. } => {
                (SubGoalKind::Generation, StrategyId::LlmDecomposition)
            }
            Impasse::OperatorFailure { .. } => (SubGoalKind::Recovery, StrategyId::GlobalSearch),
        };
        SubGoal::new(kind, impasse.describe(), query.clone(), hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::query::QueryClass;

    fn result_with(confidence: f64, similar_count: usize) -> IterationResult {
        IterationResult {
            confidence,
            similar_count,
            operator_selected: true,
            ..IterationResult::empty(StrategyId::VsaNative)
        }
    }

    #[test]
    fn low_confidence_is_state_no_change() {
        let detector = ImpasseDetector::new();
        let impasse = detector.detect(&result_with(0.05, 1)).unwrap();
        assert!(matches!(impasse, Impasse::StateNoChange { .. }));
    }

    #[test]
    fn many_candidates_is_operator_tie() {
        let detector = ImpasseDetector::new();
        let impasse = detector.detect(&result_with(0.4, 5)).unwrap();
        assert_eq!(impasse, Impasse::OperatorTie { candidates: 5 });
        // boundary: exactly 3 is not a tie
        assert!(detector.detect(&result_with(0.4, 3)).is_none());
    }

    #[test]
    fn no_operator_is_operator_no_change() {
        let detector = ImpasseDetector::new();
        let result = IterationResult::empty(StrategyId::LlmDecomposition);
        let impasse = detector.detect(&result).unwrap();
        assert!(matches!(impasse, Impasse::OperatorNoChange { .. }));
    }

    #[test]
    fn failure_takes_precedence() {
        let detector = ImpasseDetector::new();
        let mut result = IterationResult::failed(StrategyId::GlobalSearch, "substrate down");
        result.confidence = 0.0;
        result.similar_count = 10;
        let impasse = detector.detect(&result).unwrap();
        assert!(matches!(impasse, Impasse::OperatorFailure { .. }));
    }

    #[test]
    fn healthy_result_has_no_impasse() {
        let detector = ImpasseDetector::new();
        assert!(detector.detect(&result_with(0.5, 2)).is_none());
    }

    #[test]
    fn detection_is_idempotent() {
        let detector = ImpasseDetector::new();
        let result = result_with(0.05, 0);
        assert_eq!(detector.detect(&result), detector.detect(&result));
    }

    #[test]
    fn factory_maps_kinds_to_hints() {
        let factory = SubGoalFactory::new();
        let query = Query::new(QueryClass::SemanticLookup, "ambiguous term");

        let sg = factory.build(&Impasse::OperatorTie { candidates: 5 }, &query);
        assert_eq!(sg.kind, SubGoalKind::Disambiguation);
        assert_eq!(sg.strategy_hint, StrategyId::GraphDisambiguation);

        let sg = factory.build(&Impasse::StateNoChange { confidence_millis: 50 }, &query);
        assert_eq!(sg.kind, SubGoalKind::Exploration);
        assert_eq!(sg.strategy_hint, StrategyId::GlobalSearch);

        let sg = factory.build(
            &Impasse::OperatorNoChange { strategy: StrategyId::VsaNative },
            &query,
        );
        assert_eq!(sg.kind, SubGoalKind::Generation);
        assert_eq!(sg.strategy_hint, StrategyId::LlmDecomposition);

        let sg = factory.build(
            &Impasse::OperatorFailure {
                strategy: StrategyId::VsaNative,
                reason: "x".into(),
            },
            &query,
        );
        assert_eq!(sg.kind, SubGoalKind::Recovery);
        assert_eq!(sg.strategy_hint, StrategyId::GlobalSearch);
    }
}
