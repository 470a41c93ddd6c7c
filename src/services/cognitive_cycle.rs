//! The cognitive cycle: one bounded iterative reasoning attempt.
//!
//! A cycle picks a strategy by utility, executes it against the memory and
//! transducer collaborators, converts weak iterations into impasses and
//! sub-goals, and accepts the first iteration whose confidence clears the
//! success threshold. Budgets (iterations, wall clock, sub-goal queue) are
//! enforced at every step; cancellation is observable at each suspension
//! point.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::cycle::{CycleId, CycleOutcome, CycleStatus, IterationResult};
use crate::domain::models::impasse::Impasse;
use crate::domain::models::query::{CycleContext, Query};
use crate::domain::models::strategy::StrategyId;
use crate::domain::ports::memory::MemorySubstrate;
use crate::domain::ports::transducer::{LlmTransducer, TransduceRequest};
use crate::services::config::CycleConfig;
use crate::services::impasse::{ImpasseDetector, SubGoalFactory};
use crate::services::strategy_registry::StrategyRegistry;
use crate::services::template_store::{TemplateStore, TEMPLATE_DECOMPOSITION};
use crate::services::utility::UtilityEvaluator;

/// Confidence floors for empty retrievals.
const VSA_EMPTY_FLOOR: f64 = 0.1;
const GLOBAL_EMPTY_FLOOR: f64 = 0.2;
/// Disambiguation confidence with and without graph re-ranking.
const DISAMBIGUATION_CONFIDENCE: f64 = 0.8;
const DISAMBIGUATION_FALLBACK_CONFIDENCE: f64 = 0.5;
/// Decomposition confidence for parsed and unparsed tool calls.
const DECOMPOSITION_PARSED_CONFIDENCE: f64 = 0.9;
const DECOMPOSITION_UNPARSED_CONFIDENCE: f64 = 0.3;

/// Collaborators and shared services a cycle executes against.
#[derive(Clone)]
pub struct CycleDeps {
    pub memory: Arc<dyn MemorySubstrate>,
    pub transducer: Arc<dyn LlmTransducer>,
    pub registry: StrategyRegistry,
    pub templates: TemplateStore,
}

/// Handle for cooperative cancellation, shared with the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One bounded reasoning attempt for one query.
pub struct CognitiveCycle {
    id: CycleId,
    query: Query,
    context: CycleContext,
    config: CycleConfig,
    deps: CycleDeps,
    evaluator: UtilityEvaluator,
    detector: ImpasseDetector,
    factory: SubGoalFactory,
    cancel: CancelFlag,
    pending_subgoals: VecDeque<crate::domain::models::impasse::SubGoal>,
    iterations: u32,
    current_strategy: StrategyId,
    started: Instant,
}

impl CognitiveCycle {
    pub fn new(
        id: CycleId,
        query: Query,
        context: CycleContext,
        config: CycleConfig,
        deps: CycleDeps,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            id,
            query,
            context,
            config,
            deps,
            evaluator: UtilityEvaluator::new(),
            detector: ImpasseDetector::new(),
            factory: SubGoalFactory::new(),
            cancel,
            pending_subgoals: VecDeque::new(),
            iterations: 0,
            current_strategy: StrategyId::VsaNative,
            started: Instant::now(),
        }
    }

    /// Run the cycle to a terminal status. Errors never escape: every
    /// failure mode is folded into the outcome record.
    #[instrument(skip(self), fields(cycle = %self.id))]
    pub async fn run(mut self) -> (CycleStatus, CycleOutcome) {
        self.started = Instant::now();
        match self.drive().await {
            Ok(outcome) => (CycleStatus::Completed, outcome),
            Err(err) => {
                // Cancelled cycles discard their queued sub-goals.
                self.pending_subgoals.clear();
                let status = match err {
                    HrcError::Timeout { .. } => CycleStatus::TimedOut,
                    _ => CycleStatus::Failed,
                };
                debug!(status = status.as_str(), error = %err, "cycle ended without outcome");
                (
                    status,
                    CycleOutcome::failure(
                        err.kind(),
                        err.to_string(),
                        self.current_strategy,
                        self.iterations,
                    ),
                )
            }
        }
    }

    async fn drive(&mut self) -> HrcResult<CycleOutcome> {
        let strategies = self.deps.registry.list().await;
        self.current_strategy = self
            .evaluator
            .select(&strategies, self.query.class)
            .ok_or_else(|| HrcError::Integrity("strategy registry is empty".into()))?;
        debug!(strategy = %self.current_strategy, "selected initial strategy");

        let mut failure_recovered = false;

        while self.iterations < self.config.max_iterations {
            self.checkpoint()?;
            self.iterations += 1;

            let mut result = self.execute_strategy(self.current_strategy).await;
            self.checkpoint()?;

            if result.confidence >= self.config.theta_success && result.failure.is_none() {
                self.deps
                    .registry
                    .update_stats(self.current_strategy, true)
                    .await?;
                return Ok(CycleOutcome::success(&result, self.iterations));
            }

            if result.confidence < self.config.theta_disc && result.failure.is_none() {
                if let Some(outcome) = self.try_generate(&mut result).await? {
                    self.deps
                        .registry
                        .update_stats(self.current_strategy, true)
                        .await?;
                    return Ok(outcome);
                }
                self.checkpoint()?;
            }

            if let Some(impasse) = self.detector.detect(&result) {
                debug!(impasse = impasse.kind_str(), "impasse detected");
                if let Impasse::OperatorFailure { reason, .. } = &impasse {
                    if failure_recovered {
                        return Err(HrcError::Transient(reason.clone()));
                    }
                    failure_recovered = true;
                }
                self.enqueue_subgoal(&impasse)?;
                if let Some(hint) = self.pending_subgoals.back().map(|sg| sg.strategy_hint) {
                    self.current_strategy = hint;
                }
            } else {
                // Iteration made progress without resolving; queued
                // sub-goals are absorbed by it.
                self.pending_subgoals.clear();
            }

            // Give peer cycles a chance between iterations.
            tokio::task::yield_now().await;
        }

        self.deps
            .registry
            .update_stats(self.current_strategy, false)
            .await?;
        Err(HrcError::Exhausted {
            what: "iterations".into(),
            limit: self.config.max_iterations as usize,
        })
    }

    /// Invoke the generative kernel for a result below the discovery
    /// threshold. Kernel errors are tolerated as a declined synthesis.
    async fn try_generate(
        &mut self,
        result: &mut IterationResult,
    ) -> HrcResult<Option<CycleOutcome>> {
        let generated = match self
            .deps
            .transducer
            .generate(&self.query, &self.context, result)
            .await
        {
            Ok(generated) => generated,
            Err(err) => {
                warn!(error = %err, "generative kernel failed; continuing without synthesis");
                None
            }
        };
        let Some(generated) = generated else {
            return Ok(None);
        };
        if !generated.success || generated.result.is_none() {
            return Ok(None);
        }
        result.used_generation = true;
        result.confidence = generated.confidence.clamp(0.0, 1.0);
        result.best_match = generated.result;
        Ok(Some(CycleOutcome::success(result, self.iterations)))
    }

    fn enqueue_subgoal(&mut self, impasse: &Impasse) -> HrcResult<()> {
        if self.pending_subgoals.len() >= self.config.subgoal_queue_depth {
            return Err(HrcError::Exhausted {
                what: "subgoal_overflow".into(),
                limit: self.config.subgoal_queue_depth,
            });
        }
        let subgoal = self.factory.build(impasse, &self.query);
        debug!(
            kind = subgoal.kind.as_str(),
            hint = %subgoal.strategy_hint,
            "enqueued sub-goal"
        );
        self.pending_subgoals.push_back(subgoal);
        Ok(())
    }

    /// Budget checkpoint: runs before each iteration and after each
    /// suspension resumes.
    fn checkpoint(&self) -> HrcResult<()> {
        if self.cancel.is_cancelled() {
            return Err(HrcError::Cancelled);
        }
        let elapsed = self.started.elapsed();
        if elapsed > self.config.timeout() {
            #[allow(clippy::cast_possible_truncation)]
            return Err(HrcError::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Execute one strategy. Collaborator failures are captured in the
    /// result rather than propagated, so the impasse machinery can attempt
    /// recovery.
    async fn execute_strategy(&self, strategy: StrategyId) -> IterationResult {
        let outcome = match strategy {
            StrategyId::VsaNative => self.run_vsa_native().await,
            StrategyId::GraphDisambiguation => self.run_graph_disambiguation().await,
            StrategyId::LlmDecomposition => self.run_llm_decomposition().await,
            StrategyId::GlobalSearch => self.run_global_search().await,
        };
        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(strategy = %strategy, error = %err, "strategy execution failed");
                IterationResult::failed(strategy, err.to_string())
            }
        }
    }

    async fn run_vsa_native(&self) -> HrcResult<IterationResult> {
        let response = self
            .deps
            .memory
            .semantic_search(
                self.query.message_or_default(),
                self.config.search_top_k,
                self.config.min_similarity,
            )
            .await?;
        let mut result = IterationResult::empty(StrategyId::VsaNative);
        result.operator_selected = response.success;
        result.similar_count = response.results.len();
        if let Some(top) = response.results.first() {
            result.confidence = top.similarity.clamp(0.0, 1.0);
            result.best_match = Some(top.payload.clone());
        } else {
            result.confidence = VSA_EMPTY_FLOOR;
        }
        result
            .evidence
            .insert("hits".into(), Value::from(response.results.len()));
        Ok(result)
    }

    async fn run_global_search(&self) -> HrcResult<IterationResult> {
        let response = self
            .deps
            .memory
            .global_semantic_search(self.query.message_or_default(), self.config.search_top_k)
            .await?;
        let mut result = IterationResult::empty(StrategyId::GlobalSearch);
        result.operator_selected = response.success;
        result.similar_count = response.summaries.len();
        if let Some(top) = response.summaries.first() {
            result.confidence = top.similarity.clamp(0.0, 1.0);
            result.best_match = Some(top.payload.clone());
        } else {
            result.confidence = GLOBAL_EMPTY_FLOOR;
        }
        result
            .evidence
            .insert("summaries".into(), Value::from(response.summaries.len()));
        Ok(result)
    }

    async fn run_graph_disambiguation(&self) -> HrcResult<IterationResult> {
        let response = self
            .deps
            .memory
            .semantic_search(
                self.query.message_or_default(),
                self.config.search_top_k,
                self.config.min_similarity,
            )
            .await?;
        let mut result = IterationResult::empty(StrategyId::GraphDisambiguation);
        result.operator_selected = response.success;
        result.similar_count = response.results.len();

        match response.results.len() {
            0 => {
                result.confidence = VSA_EMPTY_FLOOR;
            }
            1 => {
                let only = &response.results[0];
                result.confidence = only.similarity.clamp(0.0, 1.0);
                result.best_match = Some(only.payload.clone());
            }
            _ => {
                if self.deps.memory.supports_graph_rerank() {
                    let reranked = self.deps.memory.graph_rerank(response.results).await?;
                    result.best_match = reranked.first().map(|h| h.payload.clone());
                    result.confidence = DISAMBIGUATION_CONFIDENCE;
                    result.evidence.insert("reranked".into(), Value::from(true));
                } else {
                    // Without graph support, fall back to the first
                    // candidate at reduced confidence.
                    result.best_match = Some(response.results[0].payload.clone());
                    result.confidence = DISAMBIGUATION_FALLBACK_CONFIDENCE;
                    result.evidence.insert("reranked".into(), Value::from(false));
                }
            }
        }
        Ok(result)
    }

    async fn run_llm_decomposition(&self) -> HrcResult<IterationResult> {
        let mut vars = serde_json::Map::new();
        vars.insert(
            "message".into(),
            Value::String(self.query.message_or_default().to_string()),
        );
        let prompt = self.deps.templates.get(TEMPLATE_DECOMPOSITION, &vars).await?;

        let response = self
            .deps
            .transducer
            .transduce(
                TransduceRequest::text_to_tool_call(self.query.message_or_default())
                    .with_prompt(prompt),
            )
            .await?;

        let mut result = IterationResult::empty(StrategyId::LlmDecomposition);
        result.operator_selected = response.success;
        if let Some(error) = response.error {
            result.failure = Some(error);
            result.operator_selected = true;
            return Ok(result);
        }
        if let Some(tool_call) = response.tool_call {
            result.confidence = DECOMPOSITION_PARSED_CONFIDENCE;
            result.best_match = Some(serde_json::to_value(&tool_call)?);
            result.similar_count = 1;
        } else {
            result.confidence = DECOMPOSITION_UNPARSED_CONFIDENCE;
        }
        Ok(result)
    }
}
