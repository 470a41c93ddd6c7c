//! Prompt template domain model.
//!
//! Templates are versioned append-only: a template name maps to a strictly
//! increasing list of versions, and the latest version per name is active.
//! Prior versions are never mutated, only superseded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single immutable template version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    /// Version number, starting at 1 and strictly increasing per name.
    pub version: u32,
    /// Template text with `{variable}` placeholders.
    pub text: String,
    /// Ordered set of variable names the text expects.
    pub variables: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u32>,
    /// Observed performance metrics for this version.
    #[serde(default)]
    pub performance: Map<String, Value>,
}

impl PromptTemplate {
    /// First version of a template.
    pub fn initial(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let variables = extract_variables(&text);
        Self {
            name: name.into(),
            version: 1,
            text,
            variables,
            created_at: Utc::now(),
            parent_version: None,
            performance: Map::new(),
        }
    }

    /// Derive the next version from this one with new text.
    pub fn successor(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        let variables = extract_variables(&text);
        Self {
            name: self.name.clone(),
            version: self.version + 1,
            text,
            variables,
            created_at: Utc::now(),
            parent_version: Some(self.version),
            performance: Map::new(),
        }
    }

    /// Render the template, substituting `{variable}` occurrences. Missing
    /// variables render empty.
    pub fn render(&self, variables: &Map<String, Value>) -> String {
        let mut out = self.text.clone();
        for name in &self.variables {
            let needle = format!("{{{name}}}");
            let replacement = variables
                .get(name)
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            out = out.replace(&needle, &replacement);
        }
        out
    }
}

/// Why a template evolution was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionReason {
    /// The same unknown message keeps recurring.
    RecurringUnknown,
    /// Cycles are burning more than half their iteration budget.
    ExcessIterations,
    /// The state monitor raised an adaptation trigger.
    AdaptationPressure,
}

impl EvolutionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecurringUnknown => "recurring_unknown",
            Self::ExcessIterations => "excess_iterations",
            Self::AdaptationPressure => "adaptation_pressure",
        }
    }
}

/// Analysis handed to the template store when requesting an evolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionAnalysis {
    pub reason: EvolutionReason,
    /// Recurring message selector, for [`EvolutionReason::RecurringUnknown`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_message: Option<String>,
    /// Iterations observed, for [`EvolutionReason::ExcessIterations`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_iterations: Option<u32>,
}

impl EvolutionAnalysis {
    pub fn recurring_unknown(message: impl Into<String>) -> Self {
        Self {
            reason: EvolutionReason::RecurringUnknown,
            recurring_message: Some(message.into()),
            observed_iterations: None,
        }
    }

    pub fn excess_iterations(iterations: u32) -> Self {
        Self {
            reason: EvolutionReason::ExcessIterations,
            recurring_message: None,
            observed_iterations: Some(iterations),
        }
    }

    pub fn adaptation_pressure() -> Self {
        Self {
            reason: EvolutionReason::AdaptationPressure,
            recurring_message: None,
            observed_iterations: None,
        }
    }
}

/// Extract `{variable}` names from template text, in order of appearance.
fn extract_variables(text: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let Some(close_rel) = rest[open + 1..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + 1 + close_rel];
        if !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !variables.iter().any(|v| v == name)
        {
            variables.push(name.to_string());
        }
        rest = &rest[open + 1 + close_rel + 1..];
    }
    variables
}
