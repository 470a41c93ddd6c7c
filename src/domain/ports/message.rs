//! Host object-system integration port.
//!
//! The host raises unresolved-message events; the core answers with a
//! pending-resolution handle whose value replaces the original dispatch
//! result.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::HrcResult;
use crate::services::orchestrator::PendingResolution;

/// An unresolved message dispatch raised by the host object system.
#[derive(Debug, Clone)]
pub struct UnresolvedMessage {
    /// Selector of the message that failed to dispatch.
    pub message_name: String,
    /// Printable descriptor of the receiver.
    pub receiver_descriptor: String,
    /// Positional arguments of the dispatch.
    pub args: Vec<Value>,
    /// Opaque handle identifying the originating object.
    pub originator_handle: String,
}

/// Sink for unresolved dispatches. The orchestrator implements this; hosts
/// hold it as their `doesNotUnderstand` escape hatch.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Wrap the unresolved dispatch in a reasoning cycle and return a handle
    /// that resolves when the cycle completes.
    async fn dispatch_unresolved(
        &self,
        message: UnresolvedMessage,
    ) -> HrcResult<PendingResolution>;
}
