//! LLM transducer port.
//!
//! The language-model transducer converts between natural language,
//! schemas, and tool calls, and hosts the generative kernel the cycle falls
//! back to when retrieval confidence collapses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::HrcResult;
use crate::domain::models::cycle::IterationResult;
use crate::domain::models::query::{CycleContext, Query};

/// Transduction method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransduceMethod {
    Generate,
    SchemaToText,
    TextToToolCall,
}

/// A transduction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransduceRequest {
    pub method: TransduceMethod,
    /// Input text for the transduction.
    pub text: String,
    /// Optional prompt rendered from the template store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl TransduceRequest {
    pub fn text_to_tool_call(text: impl Into<String>) -> Self {
        Self {
            method: TransduceMethod::TextToToolCall,
            text: text.into(),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// A parsed tool call produced by `textToToolCall` transduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Response to a transduction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransduceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a generative-kernel invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub confidence: f64,
}

/// Contract with the language-model transducer.
#[async_trait]
pub trait LlmTransducer: Send + Sync {
    /// Run a transduction.
    async fn transduce(&self, request: TransduceRequest) -> HrcResult<TransduceResponse>;

    /// Invoke the generative kernel to synthesize a result for a query whose
    /// retrieval confidence fell below the discovery threshold. Returns
    /// `None` when the kernel declines to synthesize.
    async fn generate(
        &self,
        query: &Query,
        context: &CycleContext,
        iteration: &IterationResult,
    ) -> HrcResult<Option<GenerativeResult>>;
}
