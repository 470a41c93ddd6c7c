//! Free-energy optimizer scenarios and boundary behaviors.

use noesis::domain::errors::HrcError;
use noesis::domain::models::candidate::{FreeEnergyWeights, SolutionCandidate};
use noesis::services::config::FreeEnergyConfig;
use noesis::services::free_energy::FreeEnergyOptimizer;

#[test]
fn composite_formula_with_default_weights() {
    // Measured set-level S = 0.4, I = 0.5; per-candidate (C, N) as given.
    let weights = FreeEnergyWeights::default();
    let g: Vec<f64> = [(0.1, 0.2), (0.8, 0.1), (0.3, 0.5)]
        .into_iter()
        .map(|(c, n)| weights.compose(0.4, 0.5, c, n))
        .collect();

    assert!((g[0] - (-0.16 + 0.15 + 0.02 - 0.02)).abs() < 1e-12);
    assert!((g[1] - (-0.16 + 0.15 + 0.16 - 0.01)).abs() < 1e-12);
    assert!((g[2] - (-0.16 + 0.15 + 0.06 - 0.05)).abs() < 1e-12);

    // Deterministic values: [-0.01, 0.14, 0.00]; argmin selects the first.
    let winner = g
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i, _)| i);
    assert_eq!(winner, Some(0));
}

#[tokio::test]
async fn selection_over_textual_candidates_is_deterministic() {
    let optimizer = FreeEnergyOptimizer::with_defaults();
    let set: Vec<SolutionCandidate> = [
        "a novel entropy sketch for the system",
        "a distributed parallel search index optimization algorithm with neural learning layers",
        "a plain system note",
    ]
    .into_iter()
    .map(SolutionCandidate::new)
    .collect();

    let (first_winner, first_scored) = optimizer.select(&set).await.unwrap();
    for _ in 0..10 {
        let (winner, scored) = optimizer.select(&set).await.unwrap();
        assert_eq!(winner, first_winner);
        assert_eq!(scored.free_energy, first_scored.free_energy);
    }
}

#[tokio::test]
async fn empty_candidate_set_is_invalid() {
    let optimizer = FreeEnergyOptimizer::with_defaults();
    let err = optimizer.select(&[]).await.unwrap_err();
    assert!(matches!(err, HrcError::Invalid(_)));
}

#[tokio::test]
async fn ties_break_by_cost_then_earliest_index() {
    let optimizer = FreeEnergyOptimizer::with_defaults();
    // Identical texts tie on G and C; the earliest index must win.
    let set: Vec<SolutionCandidate> = ["same words here", "same words here"]
        .into_iter()
        .map(SolutionCandidate::new)
        .collect();
    let (winner, _) = optimizer.select(&set).await.unwrap();
    assert_eq!(winner, 0);
}

#[test]
fn component_scores_stay_in_unit_interval() {
    let sets: [&[&str]; 3] = [
        &["short"],
        &["novel fractal entropy consciousness breakthrough pioneering"],
        &[
            "a modular hierarchical distributed system interface",
            "parallel search index optimization algorithm data process",
            "completely unrelated plain words",
        ],
    ];
    for texts in sets {
        let set: Vec<SolutionCandidate> =
            texts.iter().map(|t| SolutionCandidate::new(*t)).collect();
        let s = FreeEnergyOptimizer::structured_entropy(&set);
        let i = FreeEnergyOptimizer::coherence(&set);
        assert!((0.0..=1.0).contains(&s), "entropy {s} out of range");
        assert!((0.0..=1.0).contains(&i), "coherence {i} out of range");
        for candidate in &set {
            let c = FreeEnergyOptimizer::cost(candidate);
            let n = FreeEnergyOptimizer::novelty(candidate);
            assert!((0.0..=1.0).contains(&c), "cost {c} out of range");
            assert!((0.0..=1.0).contains(&n), "novelty {n} out of range");
        }
    }
}

#[tokio::test]
async fn evaluation_history_ring_buffer_holds_depth() {
    let optimizer = FreeEnergyOptimizer::new(FreeEnergyConfig {
        history_depth: 5,
        ..FreeEnergyConfig::default()
    });
    let set = vec![SolutionCandidate::new("only one")];
    for _ in 0..12 {
        optimizer.select(&set).await.unwrap();
    }
    assert_eq!(optimizer.history().await.len(), 5);
}
