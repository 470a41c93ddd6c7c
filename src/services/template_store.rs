//! Versioned prompt template store.
//!
//! Templates are append-only per name: evolutions push a new version and
//! never touch prior ones. The latest version per name is the active one
//! used for rendering.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::template::{EvolutionAnalysis, EvolutionReason, PromptTemplate};

/// Template names seeded at init.
pub const TEMPLATE_UNKNOWN_MESSAGE: &str = "unknown_message";
pub const TEMPLATE_DECOMPOSITION: &str = "decomposition";
pub const TEMPLATE_EXPLORATION: &str = "exploration";

/// Identifier of a stored template version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVersionId {
    pub name: String,
    pub version: u32,
}

/// Serializable snapshot of every version list, for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot(pub BTreeMap<String, Vec<PromptTemplate>>);

/// Append-only versioned template store.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: Arc<RwLock<BTreeMap<String, Vec<PromptTemplate>>>>,
}

impl TemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            templates: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a store holding the seeded prompting templates.
    pub async fn with_seeds() -> Self {
        let store = Self::new();
        store
            .put_initial(
                TEMPLATE_UNKNOWN_MESSAGE,
                "The receiver {receiver} did not understand the message {message}. \
                 Infer the most plausible intent and answer it.",
            )
            .await;
        store
            .put_initial(
                TEMPLATE_DECOMPOSITION,
                "Decompose the query into tool calls: {message}",
            )
            .await;
        store
            .put_initial(
                TEMPLATE_EXPLORATION,
                "Broaden the search for: {message}. Consider adjacent concepts.",
            )
            .await;
        store
    }

    async fn put_initial(&self, name: &str, text: &str) {
        let mut templates = self.templates.write().await;
        templates
            .entry(name.to_string())
            .or_insert_with(|| vec![PromptTemplate::initial(name, text)]);
    }

    /// The active (latest) version of a template.
    pub async fn latest(&self, name: &str) -> HrcResult<PromptTemplate> {
        let templates = self.templates.read().await;
        templates
            .get(name)
            .and_then(|versions| versions.last())
            .cloned()
            .ok_or_else(|| HrcError::Integrity(format!("template name missing: {name}")))
    }

    /// Render the active version with `{variable}` substitution. Missing
    /// variables render empty.
    pub async fn get(&self, name: &str, variables: &Map<String, Value>) -> HrcResult<String> {
        Ok(self.latest(name).await?.render(variables))
    }

    /// All versions of a template, oldest first.
    pub async fn versions(&self, name: &str) -> Vec<PromptTemplate> {
        let templates = self.templates.read().await;
        templates.get(name).cloned().unwrap_or_default()
    }

    /// Total number of stored versions across all names.
    pub async fn version_count(&self) -> usize {
        let templates = self.templates.read().await;
        templates.values().map(Vec::len).sum()
    }

    /// Evolve a template according to an analysis. Produces a new version
    /// derived from the latest; prior versions stay untouched.
    pub async fn evolve(
        &self,
        name: &str,
        analysis: &EvolutionAnalysis,
    ) -> HrcResult<TemplateVersionId> {
        let mut templates = self.templates.write().await;
        let versions = templates
            .get_mut(name)
            .ok_or_else(|| HrcError::Integrity(format!("template name missing: {name}")))?;
        let latest = versions
            .last()
            .ok_or_else(|| HrcError::Integrity(format!("template has no versions: {name}")))?;

        let evolved_text = match analysis.reason {
            EvolutionReason::RecurringUnknown => {
                let message = analysis.recurring_message.as_deref().unwrap_or("{message}");
                format!(
                    "{}\nThe message '{message}' has recurred; resolve it specifically \
                     before generalizing.",
                    latest.text
                )
            }
            EvolutionReason::ExcessIterations => {
                format!(
                    "{}\nDecompose the problem step by step before answering.",
                    latest.text
                )
            }
            EvolutionReason::AdaptationPressure => {
                format!(
                    "{}\nPrefer the simplest resolution path available.",
                    latest.text
                )
            }
        };

        let next = latest.successor(evolved_text);
        let id = TemplateVersionId {
            name: next.name.clone(),
            version: next.version,
        };
        versions.push(next);

        info!(
            template = name,
            version = id.version,
            reason = analysis.reason.as_str(),
            "evolved template"
        );
        Ok(id)
    }

    /// Attach a performance observation to the latest version of a name.
    pub async fn record_performance(&self, name: &str, key: &str, value: Value) {
        let mut templates = self.templates.write().await;
        if let Some(latest) = templates.get_mut(name).and_then(|v| v.last_mut()) {
            latest.performance.insert(key.to_string(), value);
        }
    }

    /// Snapshot every version list.
    pub async fn snapshot(&self) -> TemplateSnapshot {
        TemplateSnapshot(self.templates.read().await.clone())
    }

    /// Replace store contents from a snapshot, validating monotone versions.
    pub async fn restore(&self, snapshot: TemplateSnapshot) -> HrcResult<()> {
        for (name, versions) in &snapshot.0 {
            for (i, version) in versions.iter().enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let expected = i as u32 + 1;
                if version.version != expected {
                    return Err(HrcError::Integrity(format!(
                        "template {name} has non-monotone version {} at position {i}",
                        version.version
                    )));
                }
            }
        }
        *self.templates.write().await = snapshot.0;
        Ok(())
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}
