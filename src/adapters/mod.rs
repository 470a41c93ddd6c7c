//! In-process collaborator implementations.
//!
//! These adapters honor the domain ports with deterministic local behavior.
//! Production deployments swap them for out-of-process substrates.

pub mod event_log;
pub mod memory;
pub mod transducer;

pub use event_log::{JsonlEventSink, MemoryEventSink, NullEventSink};
pub use memory::KeywordMemory;
pub use transducer::ScriptedTransducer;
