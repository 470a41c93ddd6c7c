//! Collaborator ports: contracts with the world outside the core.

pub mod events;
pub mod memory;
pub mod message;
pub mod transducer;

pub use events::{EventKind, EventRecord, EventSink};
pub use memory::{GlobalSearchResponse, MemorySubstrate, SearchHit, SearchResponse, SummaryHit};
pub use message::{MessageSink, UnresolvedMessage};
pub use transducer::{
    GenerativeResult, LlmTransducer, ToolCall, TransduceMethod, TransduceRequest,
    TransduceResponse,
};
