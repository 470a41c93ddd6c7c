//! Orchestrator-level flows: interception, cancellation, autopoiesis, and
//! the embedding surface contract.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::orchestrator;
use noesis::adapters::event_log::MemoryEventSink;
use noesis::adapters::memory::KeywordMemory;
use noesis::adapters::transducer::ScriptedTransducer;
use noesis::domain::errors::{ErrorKind, HrcError};
use noesis::domain::models::strategy::StrategyId;
use noesis::domain::ports::events::EventKind;
use noesis::domain::ports::message::{MessageSink, UnresolvedMessage};
use noesis::services::config::{Config, CycleConfig};
use noesis::services::orchestrator::HrcOrchestrator;
use noesis::services::template_store::{TEMPLATE_DECOMPOSITION, TEMPLATE_UNKNOWN_MESSAGE};
use noesis::{CycleContext, Query, QueryClass};
use serde_json::json;

#[tokio::test]
async fn unresolved_dispatch_resolves_via_cycle() {
    let memory = KeywordMemory::new();
    memory
        .insert("frobnicate", "frobnication: rotating the widget core", 0.85)
        .await;
    let orch = orchestrator(Config::default(), memory, ScriptedTransducer::default()).await;

    let pending = orch
        .dispatch_unresolved(UnresolvedMessage {
            message_name: "frobnicate".into(),
            receiver_descriptor: "a Widget".into(),
            args: vec![json!(3)],
            originator_handle: "widget-3".into(),
        })
        .await
        .unwrap();

    assert!(!pending.is_ready() || pending.try_get().is_some());
    let outcome = pending.wait().await;
    assert!(outcome.success);
    // The DoesNotUnderstand boost favors the vsa_native path.
    assert_eq!(outcome.strategy, StrategyId::VsaNative);
}

#[tokio::test]
async fn failed_cycle_resolves_with_error_record_not_panic() {
    // No memory entry and no generative kernel: the dispatch resolves to a
    // failure record carrying the error taxonomy tag.
    let config = Config {
        cycle: CycleConfig {
            max_iterations: 2,
            ..CycleConfig::default()
        },
        ..Config::default()
    };
    let orch = orchestrator(config, KeywordMemory::new(), ScriptedTransducer::default()).await;

    let pending = orch
        .dispatch_unresolved(UnresolvedMessage {
            message_name: "vanish".into(),
            receiver_descriptor: "a Ghost".into(),
            args: Vec::new(),
            originator_handle: "ghost-1".into(),
        })
        .await
        .unwrap();

    let outcome = pending.wait().await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Exhausted));
    assert_eq!(outcome.iterations, 2);
}

#[tokio::test]
async fn cancellation_discards_the_cycle() {
    let memory = KeywordMemory::new().with_latency(Duration::from_millis(80));
    let orch = orchestrator(Config::default(), memory, ScriptedTransducer::default()).await;

    let id = orch
        .submit(
            Query::new(QueryClass::SemanticLookup, "slow to answer"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    orch.cancel(id).await.unwrap();

    let outcome = orch.resolution(id).await.unwrap().wait().await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Cancelled));

    let record = orch.status(id).await.unwrap();
    assert!(record.status.is_terminal());
}

#[tokio::test]
async fn cancel_of_unknown_cycle_reports_not_found() {
    let orch = orchestrator(
        Config::default(),
        KeywordMemory::new(),
        ScriptedTransducer::default(),
    )
    .await;
    let missing = noesis::CycleId::new();
    assert!(matches!(
        orch.cancel(missing).await,
        Err(HrcError::CycleNotFound(_))
    ));
}

#[tokio::test]
async fn recurring_unknowns_specialize_the_template() {
    let memory = KeywordMemory::new();
    memory.insert("frobnicate", "the frobnication procedure", 0.9).await;
    let events = MemoryEventSink::new();
    let orch = HrcOrchestrator::new(
        Config::default(),
        Arc::new(memory),
        Arc::new(ScriptedTransducer::default()),
        Arc::new(events.clone()),
    )
    .await;

    for _ in 0..4 {
        let pending = orch
            .dispatch_unresolved(UnresolvedMessage {
                message_name: "frobnicate".into(),
                receiver_descriptor: "a Widget".into(),
                args: Vec::new(),
                originator_handle: "widget-1".into(),
            })
            .await
            .unwrap();
        pending.wait().await;
    }

    let versions = orch.templates().versions(TEMPLATE_UNKNOWN_MESSAGE).await;
    assert!(versions.len() >= 2);
    let latest = versions.last().unwrap();
    assert!(latest.text.contains("frobnicate"));
    assert_eq!(latest.parent_version, Some(latest.version - 1));

    assert!(events
        .records()
        .await
        .iter()
        .any(|r| r.kind == EventKind::TemplateEvolved));
}

#[tokio::test]
async fn long_cycles_emit_decomposition_variants() {
    // 8 of 10 iterations burned: over half the budget triggers the
    // step-by-step template variant.
    let memory = KeywordMemory::new();
    memory.insert("plateau", "middling answer", 0.5).await;
    let config = Config {
        cycle: CycleConfig {
            max_iterations: 8,
            ..CycleConfig::default()
        },
        ..Config::default()
    };
    let orch = orchestrator(config, memory, ScriptedTransducer::default()).await;

    let id = orch
        .submit(
            Query::new(QueryClass::SemanticLookup, "plateau"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    orch.resolution(id).await.unwrap().wait().await;

    let versions = orch.templates().versions(TEMPLATE_DECOMPOSITION).await;
    assert!(versions.len() >= 2);
    assert!(versions.last().unwrap().text.contains("step by step"));
}

#[tokio::test]
async fn concurrent_cycles_make_independent_progress() {
    let memory = KeywordMemory::new().with_latency(Duration::from_millis(20));
    memory.insert("alpha", "the first answer", 0.9).await;
    memory.insert("beta", "the second answer", 0.9).await;
    let orch = orchestrator(Config::default(), memory, ScriptedTransducer::default()).await;

    let a = orch
        .submit(Query::new(QueryClass::SemanticLookup, "alpha"), CycleContext::new())
        .await
        .unwrap();
    let b = orch
        .submit(Query::new(QueryClass::SemanticLookup, "beta"), CycleContext::new())
        .await
        .unwrap();

    let (ra, rb) = tokio::join!(
        async { orch.resolution(a).await.unwrap().wait().await },
        async { orch.resolution(b).await.unwrap().wait().await },
    );
    assert!(ra.success);
    assert!(rb.success);

    let stats = orch.statistics().await;
    assert_eq!(stats.completed, 2);
    assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn statistics_expose_the_embedding_surface_fields() {
    let orch = orchestrator(
        Config::default(),
        KeywordMemory::new(),
        ScriptedTransducer::default(),
    )
    .await;
    let stats = orch.statistics().await;
    let value = serde_json::to_value(&stats).unwrap();
    for field in [
        "active_cycles",
        "completed",
        "success_rate",
        "avg_iterations",
        "free_energy",
        "template_versions",
    ] {
        assert!(value.get(field).is_some(), "missing field {field}");
    }
}
