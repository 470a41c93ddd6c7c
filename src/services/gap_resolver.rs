//! Progressive gap resolver: roadmap ingestion, gap-to-context matching,
//! and concept evolution.
//!
//! Each sweep runs three phases: extract roadmap concepts into the open-gap
//! map, ingest context fractals from the corpus, and resolve gaps whose
//! keywords intersect an ingested context. A resolution emits a concept
//! bound to its immutable (gap, context) pair under a unique provenance id.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::adapters::event_log::append_quietly;
use crate::domain::errors::HrcResult;
use crate::domain::models::knowledge::{Concept, ContextFractal, Gap};
use crate::domain::ports::events::{EventKind, EventRecord, EventSink};
use crate::services::config::ResolverConfig;

/// Phase tags assigned to extracted roadmap concepts.
const PHASE_KEYWORDS: [(&str, &[&str]); 4] = [
    ("foundation", &["foundation", "core", "substrate", "kernel"]),
    ("integration", &["integration", "bridge", "interface", "protocol"]),
    ("optimization", &["optimization", "performance", "tuning", "scaling"]),
    ("cognition", &["reasoning", "memory", "learning", "cognition"]),
];

/// Report emitted after one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub gaps_total: usize,
    pub gaps_resolved_now: usize,
    pub gaps_remaining: usize,
    pub concepts_new: usize,
}

/// The knowledge-acquisition loop.
#[derive(Clone)]
pub struct GapResolver {
    config: ResolverConfig,
    session: String,
    gaps: Arc<RwLock<BTreeMap<String, Gap>>>,
    contexts: Arc<RwLock<Vec<ContextFractal>>>,
    concepts: Arc<RwLock<Vec<Concept>>>,
    events: Arc<dyn EventSink>,
}

impl GapResolver {
    pub fn new(config: ResolverConfig, session: impl Into<String>, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            session: session.into(),
            gaps: Arc::new(RwLock::new(BTreeMap::new())),
            contexts: Arc::new(RwLock::new(Vec::new())),
            concepts: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    /// Seed a gap directly, outside roadmap extraction.
    pub async fn seed_gap(&self, gap: Gap) {
        let mut gaps = self.gaps.write().await;
        gaps.entry(gap.key.clone()).or_insert(gap);
    }

    /// Current gap map, resolved and open.
    pub async fn gaps(&self) -> Vec<Gap> {
        self.gaps.read().await.values().cloned().collect()
    }

    /// Concepts emitted so far, oldest first.
    pub async fn concepts(&self) -> Vec<Concept> {
        self.concepts.read().await.clone()
    }

    /// Ingested context fractals.
    pub async fn contexts(&self) -> Vec<ContextFractal> {
        self.contexts.read().await.clone()
    }

    /// Run one extract-ingest-resolve sweep.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> HrcResult<SweepReport> {
        if let Some(roadmap) = self.config.roadmap_path.clone() {
            self.extract_roadmap(Path::new(&roadmap)).await?;
        }
        if let Some(corpus) = self.config.context_path.clone() {
            self.ingest_contexts(Path::new(&corpus)).await?;
        }
        let report = self.resolve_gaps().await;

        append_quietly(
            &self.events,
            EventRecord::new(
                &self.session,
                EventKind::GapSweep,
                json!({
                    "gaps_total": report.gaps_total,
                    "gaps_resolved_now": report.gaps_resolved_now,
                    "gaps_remaining": report.gaps_remaining,
                    "concepts_new": report.concepts_new,
                }),
            ),
        )
        .await;

        info!(
            gaps_total = report.gaps_total,
            resolved_now = report.gaps_resolved_now,
            remaining = report.gaps_remaining,
            "gap sweep finished"
        );
        Ok(report)
    }

    /// Phase 1: extract roadmap concepts and seed the gap map.
    async fn extract_roadmap(&self, path: &Path) -> HrcResult<()> {
        if !path.exists() {
            warn!(path = %path.display(), "roadmap source missing; skipping extraction");
            return Ok(());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let mut gaps = self.gaps.write().await;
        for line in content.lines() {
            let trimmed = line.trim().trim_start_matches(['-', '*', '#']).trim();
            if trimmed.len() < 4 {
                continue;
            }
            let key = slugify(trimmed);
            let phase = phase_tag(trimmed);
            gaps.entry(key.clone()).or_insert_with(|| {
                debug!(gap = %key, phase, "extracted roadmap gap");
                Gap::new(key.clone(), format!("[{phase}] {trimmed}"), 1)
            });
        }
        Ok(())
    }

    /// Phase 2: ingest context fractals, one per corpus file, deduplicated
    /// by source path.
    async fn ingest_contexts(&self, path: &Path) -> HrcResult<()> {
        if !path.exists() {
            warn!(path = %path.display(), "context corpus missing; skipping ingestion");
            return Ok(());
        }
        let mut sources = Vec::new();
        if path.is_file() {
            sources.push(path.to_path_buf());
        } else {
            let mut dir = tokio::fs::read_dir(path).await?;
            while let Some(entry) = dir.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    sources.push(entry.path());
                }
            }
            sources.sort();
        }

        let mut contexts = self.contexts.write().await;
        for source in sources {
            let source_str = source.display().to_string();
            if contexts.iter().any(|c| c.source_path == source_str) {
                continue;
            }
            let content = tokio::fs::read_to_string(&source).await?;
            debug!(source = %source_str, "ingested context fractal");
            contexts.push(ContextFractal::new(source_str, content));
        }
        Ok(())
    }

    /// Phase 3: match open gaps against ingested contexts and emit
    /// concepts for the first match of each.
    async fn resolve_gaps(&self) -> SweepReport {
        let contexts = self.contexts.read().await;
        let mut gaps = self.gaps.write().await;
        let mut concepts = self.concepts.write().await;

        let gaps_total = gaps.len();
        let mut resolved_now = 0usize;

        for gap in gaps.values_mut().filter(|g| !g.resolved) {
            gap.attempts += 1;
            gap.last_seen = chrono::Utc::now();
            let keywords = gap.keywords();
            let matched = contexts.iter().find(|context| {
                let context_keywords = context.keywords();
                keywords.iter().any(|k| context_keywords.contains(k))
            });
            if let Some(context) = matched {
                let concept = Concept::from_resolution(gap, context);
                debug!(gap = %gap.key, context = %context.source_path, "gap resolved");
                concepts.push(concept);
                gap.resolved = true;
                resolved_now += 1;
            }
        }

        let gaps_remaining = gaps.values().filter(|g| !g.resolved).count();
        SweepReport {
            gaps_total,
            gaps_resolved_now: resolved_now,
            gaps_remaining,
            concepts_new: resolved_now,
        }
    }
}

/// Serializable view of the resolver's maps, for durable hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSnapshot {
    pub gaps: Vec<Gap>,
    pub contexts: Vec<ContextFractal>,
    pub concepts: Vec<Concept>,
}

impl GapResolver {
    /// Export the gap, context, and concept maps.
    pub async fn export(&self) -> ResolverSnapshot {
        ResolverSnapshot {
            gaps: self.gaps().await,
            contexts: self.contexts().await,
            concepts: self.concepts().await,
        }
    }

    /// Replace the resolver's maps from an exported snapshot.
    pub async fn restore(&self, snapshot: ResolverSnapshot) {
        let mut gaps = self.gaps.write().await;
        *gaps = snapshot
            .gaps
            .into_iter()
            .map(|g| (g.key.clone(), g))
            .collect();
        drop(gaps);
        *self.contexts.write().await = snapshot.contexts;
        *self.concepts.write().await = snapshot.concepts;
    }
}

/// Handle to a periodic sweep loop.
pub struct SweepLoopHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl SweepLoopHandle {
    /// Request the loop to stop after its current sweep.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stop and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.join.await;
    }
}

/// Spawn a periodic sweep loop over the resolver's configured sources.
pub fn spawn_periodic(resolver: GapResolver, interval: Duration) -> SweepLoopHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let join = tokio::spawn(async move {
        loop {
            if stop_flag.load(Ordering::SeqCst) {
                break;
            }
            if let Err(err) = resolver.sweep().await {
                warn!(error = %err, "periodic sweep failed");
            }
            tokio::time::sleep(interval).await;
        }
    });
    SweepLoopHandle { stop, join }
}

/// Stable lowercase key for an extracted concept line.
fn slugify(text: &str) -> String {
    let mut slug: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    while slug.contains("__") {
        slug = slug.replace("__", "_");
    }
    slug.trim_matches('_').chars().take(48).collect()
}

/// Keyword-matched phase tag for a roadmap line.
fn phase_tag(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    for (tag, keywords) in PHASE_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return tag;
        }
    }
    "exploration"
}
