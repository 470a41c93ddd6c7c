//! Terminal rendering for CLI results.

use comfy_table::{presets::UTF8_FULL, Cell, Table};
use console::style;

use crate::domain::models::candidate::ScoredCandidate;
use crate::domain::models::cycle::{CycleOutcome, CycleRecord};
use crate::services::gap_resolver::SweepReport;
use crate::services::orchestrator::OrchestratorStats;

/// Render a cycle outcome.
pub fn outcome(outcome: &CycleOutcome, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome).unwrap_or_default());
        return;
    }
    if outcome.success {
        println!("{} confidence {:.2}", style("resolved").green().bold(), outcome.confidence);
    } else {
        let tag = outcome
            .error
            .map_or("failed", |kind| kind.as_str());
        println!("{} ({tag})", style("unresolved").red().bold());
    }
    println!("  strategy:   {}", outcome.strategy);
    println!("  iterations: {}", outcome.iterations);
    if outcome.used_generation {
        println!("  {}", style("synthesized by the generative kernel").dim());
    }
    if let Some(result) = &outcome.result {
        println!("  result:     {result}");
    }
    if let Some(reason) = &outcome.error_reason {
        println!("  reason:     {reason}");
    }
}

/// Render a cycle status record.
pub fn record(record: &CycleRecord, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(record).unwrap_or_default());
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["field", "value"]);
    table.add_row(vec![Cell::new("cycle"), Cell::new(record.id.to_string())]);
    table.add_row(vec![Cell::new("status"), Cell::new(record.status.as_str())]);
    table.add_row(vec![Cell::new("class"), Cell::new(record.query.class.as_str())]);
    table.add_row(vec![Cell::new("iterations"), Cell::new(record.iterations.to_string())]);
    if let Some(strategy) = record.chosen_strategy {
        table.add_row(vec![Cell::new("strategy"), Cell::new(strategy.as_str())]);
    }
    table.add_row(vec![Cell::new("started"), Cell::new(record.started_at.to_rfc3339())]);
    if let Some(ended) = record.ended_at {
        table.add_row(vec![Cell::new("ended"), Cell::new(ended.to_rfc3339())]);
    }
    println!("{table}");
}

/// Render orchestrator statistics.
pub fn stats(stats: &OrchestratorStats, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(stats).unwrap_or_default());
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["metric", "value"]);
    table.add_row(vec![Cell::new("active cycles"), Cell::new(stats.active_cycles.to_string())]);
    table.add_row(vec![Cell::new("completed"), Cell::new(stats.completed.to_string())]);
    table.add_row(vec![
        Cell::new("success rate"),
        Cell::new(format!("{:.1}%", stats.success_rate * 100.0)),
    ]);
    table.add_row(vec![
        Cell::new("avg iterations"),
        Cell::new(format!("{:.2}", stats.avg_iterations)),
    ]);
    table.add_row(vec![
        Cell::new("free energy"),
        Cell::new(format!("{:.3}", stats.free_energy)),
    ]);
    table.add_row(vec![
        Cell::new("template versions"),
        Cell::new(stats.template_versions.to_string()),
    ]);
    println!("{table}");
}

/// Render a gap-sweep report.
pub fn sweep(report: &SweepReport, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        return;
    }
    println!(
        "{}: {} gaps, {} resolved now, {} remaining, {} new concepts",
        style("sweep").cyan().bold(),
        report.gaps_total,
        report.gaps_resolved_now,
        report.gaps_remaining,
        report.concepts_new,
    );
}

/// Render a scored candidate set with the winner highlighted.
pub fn scores(scored: &[ScoredCandidate], winner: usize, json: bool) {
    if json {
        let value = serde_json::json!({
            "selected": winner,
            "candidates": scored,
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "S", "I", "C", "N", "G", "candidate"]);
    for (i, s) in scored.iter().enumerate() {
        let marker = if i == winner { format!("{i} *") } else { i.to_string() };
        let mut preview: String = s.candidate.text.chars().take(40).collect();
        if s.candidate.text.chars().count() > 40 {
            preview.push('…');
        }
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(format!("{:.3}", s.entropy)),
            Cell::new(format!("{:.3}", s.coherence)),
            Cell::new(format!("{:.3}", s.cost)),
            Cell::new(format!("{:.3}", s.novelty)),
            Cell::new(format!("{:+.3}", s.free_energy)),
            Cell::new(preview),
        ]);
    }
    println!("{table}");
}
