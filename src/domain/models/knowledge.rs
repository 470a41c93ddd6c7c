//! Knowledge-acquisition model: gaps, context fractals, and concepts.
//!
//! A gap is an identified but unresolved knowledge requirement. Ingested
//! context fractals are matched against gaps; a match emits a concept bound
//! to the immutable (gap, context) pair that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An open knowledge requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Stable key, e.g. `entropy_metric`.
    pub key: String,
    pub description: String,
    /// Higher is more urgent.
    pub priority: u32,
    /// Resolution attempts so far.
    pub attempts: u32,
    pub last_seen: DateTime<Utc>,
    pub resolved: bool,
}

impl Gap {
    pub fn new(key: impl Into<String>, description: impl Into<String>, priority: u32) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            priority,
            attempts: 0,
            last_seen: Utc::now(),
            resolved: false,
        }
    }

    /// Lowercase keyword tokens of the gap key and description.
    pub fn keywords(&self) -> Vec<String> {
        tokenize(&format!("{} {}", self.key, self.description))
    }
}

/// A snapshot of external context ingested during a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFractal {
    pub provenance_id: Uuid,
    pub source_path: String,
    /// Content snapshot taken at ingestion time.
    pub content: String,
    pub ingested_at: DateTime<Utc>,
}

impl ContextFractal {
    pub fn new(source_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            provenance_id: Uuid::new_v4(),
            source_path: source_path.into(),
            content: content.into(),
            ingested_at: Utc::now(),
        }
    }

    pub fn keywords(&self) -> Vec<String> {
        tokenize(&self.content)
    }
}

/// An evolved knowledge unit bound to the gap and context that produced it.
///
/// Both bindings are non-optional: a concept without a source gap or source
/// context cannot exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    pub description: String,
    pub source_gap: String,
    pub source_context: Uuid,
    /// Unique provenance tag, `gap_resolution_<uuid>`.
    pub provenance: String,
    pub created_at: DateTime<Utc>,
}

impl Concept {
    pub fn from_resolution(gap: &Gap, context: &ContextFractal) -> Self {
        Self {
            name: format!("concept_{}", gap.key),
            description: format!(
                "resolved '{}' against {}",
                gap.description, context.source_path
            ),
            source_gap: gap.key.clone(),
            source_context: context.provenance_id,
            provenance: format!("gap_resolution_{}", Uuid::new_v4()),
            created_at: Utc::now(),
        }
    }
}

/// Lowercase alphanumeric tokens, underscores and hyphens treated as
/// separators.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .collect()
}
