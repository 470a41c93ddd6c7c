//! Domain errors for the Noesis reasoning core.

use thiserror::Error;

use super::models::cycle::CycleId;

/// Errors that can occur while running the reasoning core.
#[derive(Debug, Error)]
pub enum HrcError {
    /// A collaborator call (memory, transducer) failed. Recoverable inside a
    /// cycle via an operator-failure impasse.
    #[error("Transient collaborator failure: {0}")]
    Transient(String),

    /// A malformed query or context was rejected at submit time.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// A resource budget was exceeded (iterations, sub-goal queue).
    #[error("Exhausted {what}: limit {limit} reached")]
    Exhausted { what: String, limit: usize },

    /// Wall-clock cycle timeout.
    #[error("Cycle timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The cycle was cancelled by the host.
    #[error("Cycle was cancelled")]
    Cancelled,

    /// An internal invariant was violated. Halts the offending cycle but
    /// never poisons the orchestrator.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Cycle not found: {0}")]
    CycleNotFound(CycleId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type HrcResult<T> = Result<T, HrcError>;

impl HrcError {
    /// The taxonomy tag surfaced in outcome records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transient(_) => ErrorKind::Transient,
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::Exhausted { .. } => ErrorKind::Exhausted,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Integrity(_) | Self::CycleNotFound(_) => ErrorKind::Integrity,
            Self::Serialization(_) | Self::Io(_) => ErrorKind::Transient,
        }
    }
}

/// Error taxonomy tag carried on failed cycle outcomes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Invalid,
    Exhausted,
    Timeout,
    Cancelled,
    Integrity,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Invalid => "invalid",
            Self::Exhausted => "exhausted",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Integrity => "integrity",
        }
    }
}

impl From<serde_json::Error> for HrcError {
    fn from(err: serde_json::Error) -> Self {
        HrcError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for HrcError {
    fn from(err: std::io::Error) -> Self {
        HrcError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_taxonomy() {
        assert_eq!(HrcError::Transient("x".into()).kind(), ErrorKind::Transient);
        assert_eq!(HrcError::Invalid("x".into()).kind(), ErrorKind::Invalid);
        assert_eq!(
            HrcError::Exhausted { what: "iterations".into(), limit: 10 }.kind(),
            ErrorKind::Exhausted
        );
        assert_eq!(HrcError::Timeout { elapsed_ms: 30_000 }.kind(), ErrorKind::Timeout);
        assert_eq!(HrcError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(HrcError::Integrity("x".into()).kind(), ErrorKind::Integrity);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Timeout).unwrap();
        assert_eq!(json, "\"timeout\"");
    }
}
