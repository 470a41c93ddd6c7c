//! Scripted LLM transducer.
//!
//! Canned transduction and generation responses for tests and for CLI runs
//! with no language model wired. Production transducers implement the same
//! port over their own transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::{HrcError, HrcResult};
use crate::domain::models::cycle::IterationResult;
use crate::domain::models::query::{CycleContext, Query};
use crate::domain::ports::transducer::{
    GenerativeResult, LlmTransducer, ToolCall, TransduceRequest, TransduceResponse,
};

/// A transducer that answers from a fixed script.
#[derive(Clone, Default)]
pub struct ScriptedTransducer {
    tool_call: Option<String>,
    generation: Option<(Value, f64)>,
    transduce_error: Option<String>,
    generate_error: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedTransducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `textToToolCall` transductions with a parsed call to `tool`.
    pub fn with_tool_call(mut self, tool: impl Into<String>) -> Self {
        self.tool_call = Some(tool.into());
        self
    }

    /// Make the generative kernel synthesize `result` at `confidence`.
    pub fn with_generation(mut self, result: Value, confidence: f64) -> Self {
        self.generation = Some((result, confidence));
        self
    }

    /// Fail every transduction with a transient error.
    pub fn with_transduce_error(mut self, reason: impl Into<String>) -> Self {
        self.transduce_error = Some(reason.into());
        self
    }

    /// Fail every generation with a transient error.
    pub fn with_generate_error(mut self, reason: impl Into<String>) -> Self {
        self.generate_error = Some(reason.into());
        self
    }

    /// Total calls observed across both methods.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmTransducer for ScriptedTransducer {
    async fn transduce(&self, request: TransduceRequest) -> HrcResult<TransduceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.transduce_error {
            return Err(HrcError::Transient(reason.clone()));
        }
        let tool_call = self.tool_call.as_ref().map(|tool| ToolCall {
            tool: tool.clone(),
            arguments: Value::String(request.text.clone()),
        });
        Ok(TransduceResponse {
            success: true,
            result: None,
            tool_call,
            error: None,
        })
    }

    async fn generate(
        &self,
        _query: &Query,
        _context: &CycleContext,
        _iteration: &IterationResult,
    ) -> HrcResult<Option<GenerativeResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.generate_error {
            return Err(HrcError::Transient(reason.clone()));
        }
        Ok(self.generation.as_ref().map(|(result, confidence)| GenerativeResult {
            success: true,
            result: Some(result.clone()),
            confidence: *confidence,
        }))
    }
}
