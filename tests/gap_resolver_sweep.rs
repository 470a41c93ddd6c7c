//! Gap-resolution sweep over a filesystem corpus.

use std::sync::Arc;

use noesis::adapters::event_log::MemoryEventSink;
use noesis::domain::models::knowledge::Gap;
use noesis::domain::ports::events::EventKind;
use noesis::services::config::ResolverConfig;
use noesis::services::gap_resolver::GapResolver;

fn corpus_with(doc: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = dir.path().join("contexts");
    std::fs::create_dir(&corpus).expect("corpus dir");
    std::fs::write(corpus.join("doc1.md"), doc).expect("write doc");
    let path = corpus.display().to_string();
    (dir, path)
}

#[tokio::test]
async fn one_sweep_resolves_the_matching_gap_only() {
    let (_dir, corpus) = corpus_with("a note that mentions entropy in passing");
    let events = MemoryEventSink::new();
    let resolver = GapResolver::new(
        ResolverConfig {
            roadmap_path: None,
            context_path: Some(corpus),
            sweep_interval_secs: 300,
        },
        "sweep-test",
        Arc::new(events.clone()),
    );

    resolver
        .seed_gap(Gap::new("vsa_implementation", "vsa implementation", 2))
        .await;
    resolver
        .seed_gap(Gap::new("entropy_metric", "entropy metric", 1))
        .await;

    let report = resolver.sweep().await.unwrap();
    assert_eq!(report.gaps_total, 2);
    assert_eq!(report.gaps_resolved_now, 1);
    assert_eq!(report.gaps_remaining, 1);
    assert_eq!(report.concepts_new, 1);

    let concepts = resolver.concepts().await;
    assert_eq!(concepts.len(), 1);
    let concept = &concepts[0];
    assert_eq!(concept.source_gap, "entropy_metric");
    assert!(concept.provenance.starts_with("gap_resolution_"));

    // The concept binds the exact context fractal that resolved it.
    let contexts = resolver.contexts().await;
    assert_eq!(contexts.len(), 1);
    assert_eq!(concept.source_context, contexts[0].provenance_id);

    // Second sweep over an unchanged corpus resolves nothing more.
    let report = resolver.sweep().await.unwrap();
    assert_eq!(report.gaps_resolved_now, 0);
    assert_eq!(report.gaps_remaining, 1);
    assert_eq!(resolver.concepts().await.len(), 1);

    // Both sweeps were recorded.
    let sweeps = events
        .records()
        .await
        .into_iter()
        .filter(|r| r.kind == EventKind::GapSweep)
        .count();
    assert_eq!(sweeps, 2);
}

#[tokio::test]
async fn new_contexts_resolve_previously_open_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("contexts");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("first.md"), "nothing relevant").unwrap();

    let resolver = GapResolver::new(
        ResolverConfig {
            roadmap_path: None,
            context_path: Some(corpus.display().to_string()),
            sweep_interval_secs: 300,
        },
        "sweep-test",
        Arc::new(MemoryEventSink::new()),
    );
    resolver
        .seed_gap(Gap::new("hypervector_binding", "hypervector binding ops", 1))
        .await;

    let report = resolver.sweep().await.unwrap();
    assert_eq!(report.gaps_resolved_now, 0);

    // A later drop lands the missing knowledge.
    std::fs::write(
        corpus.join("second.md"),
        "implementing hypervector binding with xor",
    )
    .unwrap();
    let report = resolver.sweep().await.unwrap();
    assert_eq!(report.gaps_resolved_now, 1);
    assert_eq!(report.gaps_remaining, 0);

    let gap = resolver
        .gaps()
        .await
        .into_iter()
        .find(|g| g.key == "hypervector_binding")
        .unwrap();
    assert!(gap.resolved);
    assert_eq!(gap.attempts, 2);
}

#[tokio::test]
async fn roadmap_and_corpus_compose_in_one_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let roadmap = dir.path().join("roadmap.md");
    std::fs::write(&roadmap, "- entropy metric calibration\n- remote bridge protocol\n").unwrap();
    let corpus = dir.path().join("contexts");
    std::fs::create_dir(&corpus).unwrap();
    std::fs::write(corpus.join("doc.md"), "calibrating the entropy metric").unwrap();

    let resolver = GapResolver::new(
        ResolverConfig {
            roadmap_path: Some(roadmap.display().to_string()),
            context_path: Some(corpus.display().to_string()),
            sweep_interval_secs: 300,
        },
        "sweep-test",
        Arc::new(MemoryEventSink::new()),
    );

    let report = resolver.sweep().await.unwrap();
    assert_eq!(report.gaps_total, 2);
    assert_eq!(report.gaps_resolved_now, 1);

    let gaps = resolver.gaps().await;
    let bridge = gaps.iter().find(|g| g.key.contains("bridge")).unwrap();
    assert!(!bridge.resolved);
    assert!(bridge.description.contains("[integration]"));
}
