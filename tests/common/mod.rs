//! Shared fixtures for integration tests.

use std::sync::Arc;

use noesis::adapters::event_log::NullEventSink;
use noesis::adapters::memory::KeywordMemory;
use noesis::adapters::transducer::ScriptedTransducer;
use noesis::services::config::Config;
use noesis::services::orchestrator::HrcOrchestrator;

/// Build an orchestrator over the given in-process collaborators.
pub async fn orchestrator(
    config: Config,
    memory: KeywordMemory,
    transducer: ScriptedTransducer,
) -> HrcOrchestrator {
    HrcOrchestrator::new(
        config,
        Arc::new(memory),
        Arc::new(transducer),
        Arc::new(NullEventSink),
    )
    .await
}

/// Initialize test logging once per process.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
