//! The HRC orchestrator: cycle lifecycle, unresolved-message interception,
//! and autopoiesis.
//!
//! The orchestrator owns every live cycle as a tokio task, archives
//! completed cycles FIFO, folds their outcomes into the free-energy state,
//! and reacts to adaptation triggers by adjusting strategy priors and
//! evolving prompt templates.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::event_log::append_quietly;
use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::cycle::{CycleId, CycleOutcome, CycleRecord, CycleStatus};
use crate::domain::models::query::{CycleContext, Query};
use crate::domain::models::template::EvolutionAnalysis;
use crate::domain::ports::events::{EventKind, EventRecord, EventSink};
use crate::domain::ports::memory::MemorySubstrate;
use crate::domain::ports::message::{MessageSink, UnresolvedMessage};
use crate::domain::ports::transducer::LlmTransducer;
use crate::services::cognitive_cycle::{CancelFlag, CognitiveCycle, CycleDeps};
use crate::services::config::Config;
use crate::services::free_energy::FreeEnergyOptimizer;
use crate::services::state_monitor::{AdaptationTrigger, StateMonitor};
use crate::services::strategy_registry::StrategyRegistry;
use crate::services::template_store::{
    TemplateStore, TEMPLATE_DECOMPOSITION, TEMPLATE_UNKNOWN_MESSAGE,
};

/// How often `PendingResolution::wait` polls for the outcome.
const PENDING_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Recurrences of the same unknown message that trigger template
/// specialization.
const RECURRING_UNKNOWN_THRESHOLD: usize = 3;

/// Handle to an in-flight cycle result.
///
/// Polling is cooperative: `wait` sleeps between checks and never blocks a
/// thread.
#[derive(Debug, Clone)]
pub struct PendingResolution {
    value: Arc<Mutex<Option<CycleOutcome>>>,
}

impl PendingResolution {
    fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
        }
    }

    fn resolve(&self, outcome: CycleOutcome) {
        let mut slot = self.value.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(outcome);
        }
    }

    /// Whether the cycle has produced its outcome.
    pub fn is_ready(&self) -> bool {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    /// Take a snapshot of the outcome if it is ready.
    pub fn try_get(&self) -> Option<CycleOutcome> {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Suspend until the outcome is available.
    pub async fn wait(&self) -> CycleOutcome {
        loop {
            if let Some(outcome) = self.try_get() {
                return outcome;
            }
            tokio::time::sleep(PENDING_POLL_INTERVAL).await;
        }
    }
}

struct CycleHandle {
    record: Arc<RwLock<CycleRecord>>,
    cancel: CancelFlag,
    pending: PendingResolution,
}

/// Aggregate orchestrator statistics.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStats {
    pub active_cycles: usize,
    pub completed: usize,
    pub success_rate: f64,
    pub avg_iterations: f64,
    pub free_energy: f64,
    pub template_versions: usize,
}

/// The hierarchical reflective cognition orchestrator.
#[derive(Clone)]
pub struct HrcOrchestrator {
    config: Arc<Config>,
    session: String,
    registry: StrategyRegistry,
    templates: TemplateStore,
    optimizer: FreeEnergyOptimizer,
    monitor: StateMonitor,
    memory: Arc<dyn MemorySubstrate>,
    transducer: Arc<dyn LlmTransducer>,
    events: Arc<dyn EventSink>,
    cycles: Arc<RwLock<HashMap<CycleId, CycleHandle>>>,
    history: Arc<RwLock<VecDeque<CycleRecord>>>,
}

impl HrcOrchestrator {
    /// Build an orchestrator with seeded strategies and templates.
    pub async fn new(
        config: Config,
        memory: Arc<dyn MemorySubstrate>,
        transducer: Arc<dyn LlmTransducer>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry: StrategyRegistry::new(config.registry.clone()),
            templates: TemplateStore::with_seeds().await,
            optimizer: FreeEnergyOptimizer::new(config.free_energy.clone()),
            monitor: StateMonitor::new(config.monitor.clone()),
            session: Uuid::new_v4().to_string(),
            config: Arc::new(config),
            memory,
            transducer,
            events,
            cycles: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn optimizer(&self) -> &FreeEnergyOptimizer {
        &self.optimizer
    }

    pub fn monitor(&self) -> &StateMonitor {
        &self.monitor
    }

    /// Submit a query for resolution. Returns the id of the spawned cycle.
    #[instrument(skip(self, query, context))]
    pub async fn submit(&self, query: Query, context: CycleContext) -> HrcResult<CycleId> {
        if !query.is_well_formed() {
            return Err(HrcError::Invalid(
                "query carries neither a message nor an origin selector".into(),
            ));
        }

        let id = CycleId::new();
        let record = Arc::new(RwLock::new(CycleRecord::new(id, query.clone(), context.clone())));
        let cancel = CancelFlag::new();
        let pending = PendingResolution::new();

        {
            let mut cycles = self.cycles.write().await;
            cycles.insert(
                id,
                CycleHandle {
                    record: record.clone(),
                    cancel: cancel.clone(),
                    pending: pending.clone(),
                },
            );
        }

        append_quietly(
            &self.events,
            EventRecord::new(
                &self.session,
                EventKind::CycleSubmitted,
                json!({ "cycle": id.to_string(), "class": query.class.as_str() }),
            ),
        )
        .await;

        let cycle = CognitiveCycle::new(
            id,
            query,
            context,
            self.config.cycle.clone(),
            CycleDeps {
                memory: self.memory.clone(),
                transducer: self.transducer.clone(),
                registry: self.registry.clone(),
                templates: self.templates.clone(),
            },
            cancel,
        );

        let orchestrator = self.clone();
        tokio::spawn(async move {
            {
                let mut record = record.write().await;
                record.status = CycleStatus::Running;
            }
            let (status, outcome) = cycle.run().await;
            orchestrator.complete(id, status, outcome).await;
        });

        debug!(cycle = %id, "cycle submitted");
        Ok(id)
    }

    /// Snapshot the state of a cycle.
    pub async fn status(&self, id: CycleId) -> HrcResult<CycleRecord> {
        if let Some(handle) = self.cycles.read().await.get(&id) {
            return Ok(handle.record.read().await.clone());
        }
        let history = self.history.read().await;
        history
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(HrcError::CycleNotFound(id))
    }

    /// Request cancellation of a running cycle. Observable at the cycle's
    /// next suspension point.
    pub async fn cancel(&self, id: CycleId) -> HrcResult<()> {
        let cycles = self.cycles.read().await;
        let handle = cycles.get(&id).ok_or(HrcError::CycleNotFound(id))?;
        handle.cancel.cancel();
        info!(cycle = %id, "cancellation requested");
        Ok(())
    }

    /// The pending-resolution handle for a cycle.
    pub async fn resolution(&self, id: CycleId) -> HrcResult<PendingResolution> {
        let cycles = self.cycles.read().await;
        cycles
            .get(&id)
            .map(|h| h.pending.clone())
            .ok_or(HrcError::CycleNotFound(id))
    }

    /// Aggregate statistics over live and archived cycles.
    pub async fn statistics(&self) -> OrchestratorStats {
        let active_cycles = {
            let cycles = self.cycles.read().await;
            let statuses = futures::future::join_all(
                cycles.values().map(|h| async { h.record.read().await.status }),
            )
            .await;
            statuses.iter().filter(|s| !s.is_terminal()).count()
        };
        let (completed, success_rate, avg_iterations) = {
            let history = self.history.read().await;
            let completed = history.len();
            let successes = history
                .iter()
                .filter(|r| r.outcome.as_ref().is_some_and(|o| o.success))
                .count();
            let total_iterations: u64 =
                history.iter().map(|r| u64::from(r.iterations)).sum();
            #[allow(clippy::cast_precision_loss)]
            let success_rate = if completed == 0 {
                0.0
            } else {
                successes as f64 / completed as f64
            };
            #[allow(clippy::cast_precision_loss)]
            let avg_iterations = if completed == 0 {
                0.0
            } else {
                total_iterations as f64 / completed as f64
            };
            (completed, success_rate, avg_iterations)
        };

        OrchestratorStats {
            active_cycles,
            completed,
            success_rate,
            avg_iterations,
            free_energy: self.monitor.free_energy().await,
            template_versions: self.templates.version_count().await,
        }
    }

    /// Seal, archive, analyze, and resolve a finished cycle. The handle is
    /// retained until its record ages out of history, so late `status` and
    /// `resolution` calls keep working.
    async fn complete(&self, id: CycleId, status: CycleStatus, outcome: CycleOutcome) {
        let pending = {
            let cycles = self.cycles.read().await;
            let Some(handle) = cycles.get(&id) else {
                warn!(cycle = %id, "completed cycle had no handle");
                return;
            };
            handle.pending.clone()
        };

        let sealed = {
            let cycles = self.cycles.read().await;
            let Some(handle) = cycles.get(&id) else {
                return;
            };
            let mut record = handle.record.write().await;
            record.seal(status, outcome.clone());
            record.clone()
        };

        // Archive FIFO by completion, bounded. Evicted records take their
        // handles with them.
        let evicted = {
            let mut history = self.history.write().await;
            let evicted = if history.len() == self.config.history.cycle_depth {
                history.pop_front().map(|r| r.id)
            } else {
                None
            };
            history.push_back(sealed.clone());
            evicted
        };
        if let Some(evicted_id) = evicted {
            self.cycles.write().await.remove(&evicted_id);
        }

        append_quietly(
            &self.events,
            EventRecord::new(
                &self.session,
                EventKind::CycleCompleted,
                json!({
                    "cycle": id.to_string(),
                    "status": status.as_str(),
                    "success": outcome.success,
                    "iterations": outcome.iterations,
                }),
            ),
        )
        .await;

        self.autopoiesis(&sealed).await;

        // Fold the outcome and its candidate score into the running
        // free-energy state.
        if let Some(result) = outcome.result.as_ref().and_then(|v| v.as_str()) {
            let candidate = crate::domain::models::candidate::SolutionCandidate::new(result);
            let scored = self.optimizer.score_one(&candidate, std::slice::from_ref(&candidate));
            if let Some(trigger) = self.monitor.integrate_score(scored.free_energy).await {
                self.adapt(trigger).await;
            }
        }
        if let Some(trigger) = self.monitor.integrate_outcome(&outcome).await {
            self.adapt(trigger).await;
        }

        pending.resolve(outcome);
        info!(cycle = %id, status = status.as_str(), "cycle archived");
    }

    /// Compare the completed cycle against history and evolve templates
    /// where the evidence warrants it.
    async fn autopoiesis(&self, completed: &CycleRecord) {
        if let Some(message) = completed.query.origin_message.as_deref() {
            let history = self.history.read().await;
            let recurrences = history
                .iter()
                .filter(|r| r.query.origin_message.as_deref() == Some(message))
                .count();
            drop(history);
            if recurrences >= RECURRING_UNKNOWN_THRESHOLD {
                self.evolve_template(
                    TEMPLATE_UNKNOWN_MESSAGE,
                    &EvolutionAnalysis::recurring_unknown(message),
                )
                .await;
            }
        }

        if completed.iterations > self.config.cycle.max_iterations / 2 {
            self.evolve_template(
                TEMPLATE_DECOMPOSITION,
                &EvolutionAnalysis::excess_iterations(completed.iterations),
            )
            .await;
        }
    }

    async fn evolve_template(&self, name: &str, analysis: &EvolutionAnalysis) {
        match self.templates.evolve(name, analysis).await {
            Ok(version) => {
                append_quietly(
                    &self.events,
                    EventRecord::new(
                        &self.session,
                        EventKind::TemplateEvolved,
                        json!({
                            "template": version.name,
                            "version": version.version,
                            "reason": analysis.reason.as_str(),
                        }),
                    ),
                )
                .await;
            }
            Err(err) => warn!(template = name, error = %err, "template evolution failed"),
        }
    }

    /// React to an adaptation trigger: penalize the implicated strategy,
    /// decay priors toward their seeds, and evolve the decomposition
    /// template under pressure.
    async fn adapt(&self, trigger: AdaptationTrigger) {
        info!(
            dominant = trigger.dominant.as_str(),
            free_energy = trigger.free_energy,
            "adaptation triggered"
        );
        if let Some(strategy) = trigger.implicated_strategy {
            if let Err(err) = self.registry.apply_penalty(strategy).await {
                warn!(error = %err, "failed to penalize strategy");
            }
        }
        self.registry.decay_toward_seed().await;
        self.evolve_template(
            TEMPLATE_DECOMPOSITION,
            &EvolutionAnalysis::adaptation_pressure(),
        )
        .await;

        append_quietly(
            &self.events,
            EventRecord::new(
                &self.session,
                EventKind::AdaptationTriggered,
                json!({
                    "dominant": trigger.dominant.as_str(),
                    "free_energy": trigger.free_energy,
                }),
            ),
        )
        .await;
        self.monitor.adaptation_applied().await;
    }
}

#[async_trait]
impl MessageSink for HrcOrchestrator {
    /// Intercept an unresolved host dispatch: wrap it in a
    /// DoesNotUnderstand query, submit it, and hand back the resolution.
    async fn dispatch_unresolved(
        &self,
        message: UnresolvedMessage,
    ) -> HrcResult<PendingResolution> {
        let query = Query::from_unresolved(
            message.message_name,
            message.receiver_descriptor.clone(),
            message.args,
        )
        .with_originator(message.originator_handle);
        let context = CycleContext::new()
            .with("trigger_source", json!("does_not_understand"))
            .with("receiver", json!(message.receiver_descriptor));

        let id = self.submit(query, context).await?;
        self.resolution(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::KeywordMemory;
    use crate::adapters::transducer::ScriptedTransducer;
    use crate::adapters::event_log::{MemoryEventSink, NullEventSink};
    use crate::domain::models::query::QueryClass;

    async fn orchestrator_with(memory: KeywordMemory) -> HrcOrchestrator {
        HrcOrchestrator::new(
            Config::default(),
            Arc::new(memory),
            Arc::new(ScriptedTransducer::default()),
            Arc::new(NullEventSink),
        )
        .await
    }

    #[tokio::test]
    async fn submit_and_wait_resolves() {
        let memory = KeywordMemory::new();
        memory.insert("entropy", "disorder measure", 0.86).await;
        let orchestrator = orchestrator_with(memory).await;

        let id = orchestrator
            .submit(
                Query::new(QueryClass::SemanticLookup, "what is entropy"),
                CycleContext::new(),
            )
            .await
            .unwrap();

        let resolution = orchestrator.resolution(id).await.unwrap();
        let outcome = resolution.wait().await;
        assert!(outcome.success);
        assert_eq!(outcome.iterations, 1);

        let record = orchestrator.status(id).await.unwrap();
        assert_eq!(record.status, CycleStatus::Completed);
        assert!(record.ended_at.is_some());
    }

    #[tokio::test]
    async fn malformed_query_is_rejected() {
        let orchestrator = orchestrator_with(KeywordMemory::new()).await;
        let err = orchestrator
            .submit(Query::new(QueryClass::Generic, "   "), CycleContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HrcError::Invalid(_)));
    }

    #[tokio::test]
    async fn unknown_cycle_is_not_found() {
        let orchestrator = orchestrator_with(KeywordMemory::new()).await;
        let missing = CycleId::new();
        assert!(matches!(
            orchestrator.status(missing).await,
            Err(HrcError::CycleNotFound(_))
        ));
        assert!(matches!(
            orchestrator.cancel(missing).await,
            Err(HrcError::CycleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn cancel_produces_cancelled_outcome() {
        let memory = KeywordMemory::new().with_latency(Duration::from_millis(100));
        let orchestrator = orchestrator_with(memory).await;

        let id = orchestrator
            .submit(
                Query::new(QueryClass::SemanticLookup, "slow query"),
                CycleContext::new(),
            )
            .await
            .unwrap();
        let resolution = orchestrator.resolution(id).await.unwrap();
        orchestrator.cancel(id).await.unwrap();

        let outcome = resolution.wait().await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error,
            Some(crate::domain::errors::ErrorKind::Cancelled)
        );
    }

    #[tokio::test]
    async fn does_not_understand_interception() {
        let memory = KeywordMemory::new();
        memory.insert("frobnicate", "frobnication procedure", 0.85).await;
        let orchestrator = orchestrator_with(memory).await;

        let pending = orchestrator
            .dispatch_unresolved(UnresolvedMessage {
                message_name: "frobnicate".into(),
                receiver_descriptor: "a Widget".into(),
                args: vec![json!(1)],
                originator_handle: "widget-7".into(),
            })
            .await
            .unwrap();

        let outcome = pending.wait().await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn recurring_unknown_message_evolves_template() {
        let memory = KeywordMemory::new();
        memory.insert("frobnicate", "frobnication procedure", 0.85).await;
        let events = MemoryEventSink::new();
        let orchestrator = HrcOrchestrator::new(
            Config::default(),
            Arc::new(memory),
            Arc::new(ScriptedTransducer::default()),
            Arc::new(events.clone()),
        )
        .await;

        for _ in 0..4 {
            let pending = orchestrator
                .dispatch_unresolved(UnresolvedMessage {
                    message_name: "frobnicate".into(),
                    receiver_descriptor: "a Widget".into(),
                    args: Vec::new(),
                    originator_handle: "widget-7".into(),
                })
                .await
                .unwrap();
            pending.wait().await;
        }

        let versions = orchestrator
            .templates()
            .versions(TEMPLATE_UNKNOWN_MESSAGE)
            .await;
        assert!(versions.len() >= 2, "expected an evolved unknown-message template");

        let evolved = events
            .records()
            .await
            .into_iter()
            .any(|r| r.kind == EventKind::TemplateEvolved);
        assert!(evolved);
    }

    #[tokio::test]
    async fn statistics_reflect_history() {
        let memory = KeywordMemory::new();
        memory.insert("entropy", "disorder measure", 0.86).await;
        let orchestrator = orchestrator_with(memory).await;

        let id = orchestrator
            .submit(
                Query::new(QueryClass::SemanticLookup, "what is entropy"),
                CycleContext::new(),
            )
            .await
            .unwrap();
        orchestrator.resolution(id).await.unwrap().wait().await;

        let stats = orchestrator.statistics().await;
        assert_eq!(stats.completed, 1);
        assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);
        assert!((stats.avg_iterations - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.active_cycles, 0);
        assert_eq!(stats.template_versions, 3);
    }

    #[tokio::test]
    async fn pending_resolution_polling_contract() {
        let pending = PendingResolution::new();
        assert!(!pending.is_ready());
        assert!(pending.try_get().is_none());

        let waiter = pending.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        let outcome = CycleOutcome::failure(
            crate::domain::errors::ErrorKind::Timeout,
            "t",
            crate::domain::models::strategy::StrategyId::VsaNative,
            2,
        );
        pending.resolve(outcome);
        assert!(pending.is_ready());

        let waited = task.await.unwrap();
        assert_eq!(waited.iterations, 2);
    }
}
