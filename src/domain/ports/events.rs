//! Event sink port.
//!
//! An optional append-only sink for durable observability records. When no
//! sink is wired, events are dropped silently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::HrcResult;

/// Kind tag for event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CycleSubmitted,
    CycleCompleted,
    ImpasseDetected,
    TemplateEvolved,
    AdaptationTriggered,
    GapSweep,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycleSubmitted => "cycle_submitted",
            Self::CycleCompleted => "cycle_completed",
            Self::ImpasseDetected => "impasse_detected",
            Self::TemplateEvolved => "template_evolved",
            Self::AdaptationTriggered => "adaptation_triggered",
            Self::GapSweep => "gap_sweep",
        }
    }
}

/// One JSON-lines record handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Session the record belongs to.
    pub session: String,
    pub kind: EventKind,
    pub payload: Value,
    pub ts: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(session: impl Into<String>, kind: EventKind, payload: Value) -> Self {
        Self {
            session: session.into(),
            kind,
            payload,
            ts: Utc::now(),
        }
    }
}

/// Append-only event sink contract.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append one record. Sink failures are not allowed to disturb the
    /// caller's control flow; implementations log and swallow internal
    /// errors where possible.
    async fn append(&self, record: EventRecord) -> HrcResult<()>;
}
