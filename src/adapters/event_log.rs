//! Event sink adapters.
//!
//! `JsonlEventSink` appends one JSON object per line to a log file.
//! `NullEventSink` drops everything silently, matching the contract for an
//! unwired persistence collaborator. `MemoryEventSink` collects records for
//! assertions in tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::errors::HrcResult;
use crate::domain::ports::events::{EventRecord, EventSink};

/// Append-only JSON-lines file sink.
pub struct JsonlEventSink {
    path: PathBuf,
    // Serializes appends so records never interleave.
    lock: Mutex<()>,
}

impl JsonlEventSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl EventSink for JsonlEventSink {
    async fn append(&self, record: EventRecord) -> HrcResult<()> {
        let line = serde_json::to_string(&record)?;
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn append(&self, _record: EventRecord) -> HrcResult<()> {
        Ok(())
    }
}

/// In-memory sink for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<EventRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn append(&self, record: EventRecord) -> HrcResult<()> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

/// Append a record to an optional sink, swallowing sink failures.
pub async fn append_quietly(sink: &Arc<dyn EventSink>, record: EventRecord) {
    if let Err(err) = sink.append(record).await {
        warn!(error = %err, "event sink append failed");
    }
}
