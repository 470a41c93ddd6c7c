//! End-to-end cycle scenarios driven through the orchestrator.

mod common;

use std::time::Duration;

use common::orchestrator;
use noesis::adapters::memory::KeywordMemory;
use noesis::adapters::transducer::ScriptedTransducer;
use noesis::domain::errors::ErrorKind;
use noesis::domain::models::cycle::CycleStatus;
use noesis::domain::models::strategy::StrategyId;
use noesis::services::config::{Config, CycleConfig};
use noesis::{CycleContext, Query, QueryClass};
use serde_json::Value;

#[tokio::test]
async fn simple_semantic_hit_resolves_in_one_iteration() {
    let memory = KeywordMemory::new();
    memory.insert("entropy", "entropy measures disorder", 0.86).await;
    let orch = orchestrator(Config::default(), memory, ScriptedTransducer::default()).await;

    let id = orch
        .submit(
            Query::new(QueryClass::SemanticLookup, "what is entropy"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;

    assert!(outcome.success);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.strategy, StrategyId::VsaNative);
    assert!((outcome.confidence - 0.86).abs() < 1e-9);
    assert!(!outcome.used_generation);

    let record = orch.status(id).await.unwrap();
    assert_eq!(record.status, CycleStatus::Completed);
}

#[tokio::test]
async fn operator_tie_recovers_through_disambiguation() {
    let memory = KeywordMemory::new().with_graph_rerank();
    for (i, similarity) in [0.4, 0.39, 0.38, 0.37, 0.36].into_iter().enumerate() {
        memory
            .insert("ambiguous term", format!("sense number {i}"), similarity)
            .await;
    }
    let orch = orchestrator(Config::default(), memory, ScriptedTransducer::default()).await;

    let id = orch
        .submit(
            Query::new(QueryClass::SemanticLookup, "ambiguous term"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;

    assert!(outcome.success);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.strategy, StrategyId::GraphDisambiguation);
    assert!((outcome.confidence - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn empty_memory_falls_back_to_generation() {
    let memory = KeywordMemory::new();
    let transducer =
        ScriptedTransducer::default().with_generation(Value::String("synthesized answer".into()), 0.7);
    let orch = orchestrator(Config::default(), memory, transducer).await;

    let id = orch
        .submit(
            Query::new(QueryClass::ComplexMultiHop, "novel unseen"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;

    assert!(outcome.success);
    assert!(outcome.used_generation);
    assert_eq!(outcome.iterations, 1);
    assert!((outcome.confidence - 0.7).abs() < 1e-9);
    assert_eq!(outcome.result, Some(Value::String("synthesized answer".into())));
}

#[tokio::test]
async fn blocking_memory_calls_time_out() {
    // Each memory call eats over half the one-second budget; the cycle
    // must convert to TimedOut after at most two iterations.
    let memory = KeywordMemory::new().with_latency(Duration::from_millis(600));
    let config = Config {
        cycle: CycleConfig {
            cycle_timeout_secs: 1,
            ..CycleConfig::default()
        },
        ..Config::default()
    };
    let orch = orchestrator(config, memory, ScriptedTransducer::default()).await;

    let id = orch
        .submit(
            Query::new(QueryClass::SemanticLookup, "blocked query"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Timeout));
    assert!(outcome.iterations <= 2);

    let record = orch.status(id).await.unwrap();
    assert_eq!(record.status, CycleStatus::TimedOut);
}

#[tokio::test]
async fn max_iterations_exhausts_the_cycle() {
    // A single mid-confidence hit never clears the threshold and never
    // impasses, so the cycle spends its whole iteration budget.
    let memory = KeywordMemory::new();
    memory.insert("plateau", "a middling answer", 0.5).await;
    let config = Config {
        cycle: CycleConfig {
            max_iterations: 4,
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
    let outcome = orch.resolution(id).await.unwrap().wait().await;

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Exhausted));
    assert_eq!(outcome.iterations, 4);
}

#[tokio::test]
async fn confidence_boundary_around_theta_success() {
    // Epsilon above the threshold resolves immediately.
    let memory = KeywordMemory::new();
    memory.insert("above", "just over the line", 0.801).await;
    let orch = orchestrator(Config::default(), memory, ScriptedTransducer::default()).await;
    let id = orch
        .submit(Query::new(QueryClass::SemanticLookup, "above"), CycleContext::new())
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;
    assert!(outcome.success);
    assert_eq!(outcome.iterations, 1);

    // Epsilon below keeps iterating until the budget runs out.
    let memory = KeywordMemory::new();
    memory.insert("below", "just under the line", 0.799).await;
    let config = Config {
        cycle: CycleConfig {
            max_iterations: 3,
            ..CycleConfig::default()
        },
        ..Config::default()
    };
    let orch = orchestrator(config, memory, ScriptedTransducer::default()).await;
    let id = orch
        .submit(Query::new(QueryClass::SemanticLookup, "below"), CycleContext::new())
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Exhausted));
}

#[tokio::test]
async fn subgoal_overflow_fails_the_cycle() {
    // Persistent ties without graph support keep enqueuing sub-goals
    // until the per-cycle queue depth collapses the cycle.
    let memory = KeywordMemory::new();
    for (i, similarity) in [0.4, 0.39, 0.38, 0.37].into_iter().enumerate() {
        memory.insert("stuck term", format!("sense {i}"), similarity).await;
    }
    let config = Config {
        cycle: CycleConfig {
            subgoal_queue_depth: 2,
            ..CycleConfig::default()
        },
        ..Config::default()
    };
    let orch = orchestrator(config, memory, ScriptedTransducer::default()).await;

    let id = orch
        .submit(
            Query::new(QueryClass::SemanticLookup, "stuck term"),
            CycleContext::new(),
        )
        .await
        .unwrap();
    let outcome = orch.resolution(id).await.unwrap().wait().await;

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Exhausted));
    assert!(outcome
        .error_reason
        .as_deref()
        .unwrap_or_default()
        .contains("subgoal_overflow"));
}
