//! Command handlers wiring the CLI to an in-process core.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::adapters::event_log::{JsonlEventSink, NullEventSink};
use crate::adapters::memory::KeywordMemory;
use crate::adapters::transducer::ScriptedTransducer;
use crate::cli::{output, CliError, NON_INTERACTIVE_ENV};
use crate::domain::models::candidate::SolutionCandidate;
use crate::domain::models::cycle::CycleId;
use crate::domain::models::query::{CycleContext, Query};
use crate::domain::ports::events::EventSink;
use crate::infrastructure::ConfigLoader;
use crate::services::config::Config;
use crate::services::free_energy::FreeEnergyOptimizer;
use crate::services::gap_resolver::GapResolver;
use crate::services::orchestrator::HrcOrchestrator;
use crate::services::ResolverConfig;

/// Build the orchestrator with the bundled in-process collaborators.
async fn build_core(config: &Config, facts: Option<&Path>) -> Result<HrcOrchestrator, CliError> {
    let memory = KeywordMemory::new().with_graph_rerank();
    if let Some(path) = facts {
        seed_facts(&memory, path).await?;
    }
    let events: Arc<dyn EventSink> = match &config.persistence.event_log_path {
        Some(path) => Arc::new(JsonlEventSink::new(path)),
        None => Arc::new(NullEventSink),
    };
    Ok(HrcOrchestrator::new(
        config.clone(),
        Arc::new(memory),
        Arc::new(ScriptedTransducer::default()),
        events,
    )
    .await)
}

async fn seed_facts(memory: &KeywordMemory, path: &Path) -> Result<(), CliError> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read facts file {}", path.display()))?;
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            CliError::Protocol(format!("facts line {}: {e}", number + 1))
        })?;
        let key = value.get("key").and_then(Value::as_str).ok_or_else(|| {
            CliError::Protocol(format!("facts line {} is missing 'key'", number + 1))
        })?;
        let payload = value
            .get("payload")
            .and_then(Value::as_str)
            .unwrap_or(key);
        let similarity = value
            .get("similarity")
            .and_then(Value::as_f64)
            .unwrap_or(0.5);
        memory.insert(key, payload, similarity).await;
    }
    Ok(())
}

/// Resolve the query JSON from the argument, a file, or stdin.
fn read_query_json(
    inline: Option<String>,
    file: Option<PathBuf>,
) -> Result<String, CliError> {
    if let Some(query) = inline {
        return Ok(query);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read query file {}", path.display()))
            .map_err(CliError::Init);
    }
    // A non-empty non-interactive flag suppresses the blocking stdin read.
    if std::env::var(NON_INTERACTIVE_ENV).is_ok_and(|v| !v.is_empty()) {
        return Err(CliError::Protocol(
            "no query given and non-interactive mode is set".into(),
        ));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read query from stdin")?;
    if buffer.trim().is_empty() {
        return Err(CliError::Protocol("empty query on stdin".into()));
    }
    Ok(buffer)
}

pub fn handle_init(force: bool, json: bool) -> Result<(), CliError> {
    let path = ConfigLoader::default_path();
    let written = ConfigLoader::init(&path, force)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "written": written })
        );
    } else if written {
        println!("wrote {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

pub async fn handle_submit(
    config: Config,
    inline: Option<String>,
    file: Option<PathBuf>,
    facts: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let raw = read_query_json(inline, file)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::Protocol(format!("malformed query JSON: {e}")))?;
    let query = Query::from_json(&value);

    let orchestrator = build_core(&config, facts.as_deref()).await?;
    let id = orchestrator
        .submit(query, CycleContext::new())
        .await
        .map_err(|e| CliError::Protocol(e.to_string()))?;
    let resolution = orchestrator
        .resolution(id)
        .await
        .map_err(|e| CliError::Init(anyhow::anyhow!(e)))?;
    let outcome = resolution.wait().await;

    if !json {
        println!("cycle {id}");
    }
    output::outcome(&outcome, json);
    Ok(())
}

pub async fn handle_status(config: Config, cycle_id: &str, json: bool) -> Result<(), CliError> {
    let id: CycleId = cycle_id
        .parse()
        .map_err(|_| CliError::Protocol(format!("malformed cycle id: {cycle_id}")))?;
    let orchestrator = build_core(&config, None).await?;
    match orchestrator.status(id).await {
        Ok(record) => {
            output::record(&record, json);
            Ok(())
        }
        Err(err) => Err(CliError::Protocol(err.to_string())),
    }
}

pub async fn handle_cancel(config: Config, cycle_id: &str, json: bool) -> Result<(), CliError> {
    let id: CycleId = cycle_id
        .parse()
        .map_err(|_| CliError::Protocol(format!("malformed cycle id: {cycle_id}")))?;
    let orchestrator = build_core(&config, None).await?;
    match orchestrator.cancel(id).await {
        Ok(()) => {
            if json {
                println!("{}", serde_json::json!({ "cancelled": id.to_string() }));
            } else {
                println!("cancelled {id}");
            }
            Ok(())
        }
        Err(err) => Err(CliError::Protocol(err.to_string())),
    }
}

pub async fn handle_stats(config: Config, json: bool) -> Result<(), CliError> {
    let orchestrator = build_core(&config, None).await?;
    let stats = orchestrator.statistics().await;
    output::stats(&stats, json);
    Ok(())
}

pub async fn handle_sweep(
    config: Config,
    roadmap: Option<PathBuf>,
    contexts: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let resolver_config = ResolverConfig {
        roadmap_path: roadmap
            .map(|p| p.display().to_string())
            .or(config.resolver.roadmap_path.clone()),
        context_path: contexts
            .map(|p| p.display().to_string())
            .or(config.resolver.context_path.clone()),
        sweep_interval_secs: config.resolver.sweep_interval_secs,
    };
    let events: Arc<dyn EventSink> = match &config.persistence.event_log_path {
        Some(path) => Arc::new(JsonlEventSink::new(path)),
        None => Arc::new(NullEventSink),
    };
    let resolver = GapResolver::new(resolver_config, "cli", events);
    let report = resolver
        .sweep()
        .await
        .map_err(|e| CliError::Init(anyhow::anyhow!(e)))?;
    output::sweep(&report, json);
    Ok(())
}

pub async fn handle_score(config: Config, file: PathBuf, json: bool) -> Result<(), CliError> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read candidates file {}", file.display()))?;
    let candidates: Vec<SolutionCandidate> = if content.trim_start().starts_with('[') {
        let texts: Vec<String> = serde_json::from_str(&content)
            .map_err(|e| CliError::Protocol(format!("malformed candidate array: {e}")))?;
        texts.into_iter().map(SolutionCandidate::new).collect()
    } else {
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(SolutionCandidate::new)
            .collect()
    };
    if candidates.is_empty() {
        return Err(CliError::Protocol("candidate set is empty".into()));
    }

    let optimizer = FreeEnergyOptimizer::new(config.free_energy.clone());
    let scored = optimizer.score_set(&candidates);
    let (winner, _) = optimizer
        .select(&candidates)
        .await
        .map_err(|e| CliError::Protocol(e.to_string()))?;
    output::scores(&scored, winner, json);
    Ok(())
}
