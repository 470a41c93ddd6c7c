//! Query domain model.
//!
//! A query is the unit of work the orchestrator reasons about: a direct
//! user question, or an unresolved message dispatch intercepted from the
//! host object system.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification of an inbound query, used for strategy-utility
/// adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    /// The host object system failed to dispatch a message.
    DoesNotUnderstand,
    /// Requires chaining multiple retrieval or reasoning hops.
    ComplexMultiHop,
    /// A direct lookup against the memory substrate.
    SemanticLookup,
    /// Anything else.
    Generic,
}

impl Default for QueryClass {
    fn default() -> Self {
        Self::Generic
    }
}

impl QueryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoesNotUnderstand => "does_not_understand",
            Self::ComplexMultiHop => "complex_multi_hop",
            Self::SemanticLookup => "semantic_lookup",
            Self::Generic => "generic",
        }
    }

    /// Parse a class name. Unknown classes default to [`QueryClass::Generic`]
    /// rather than failing the submit.
    pub fn parse_or_generic(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "does_not_understand" | "doesnotunderstand" => Self::DoesNotUnderstand,
            "complex_multi_hop" | "complexmultihop" => Self::ComplexMultiHop,
            "semantic_lookup" | "semanticlookup" => Self::SemanticLookup,
            _ => Self::Generic,
        }
    }
}

/// A query submitted to the reasoning core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Query classification.
    #[serde(default, rename = "kind", alias = "class")]
    pub class: QueryClass,
    /// Free-form payload. The `message` key carries the query text.
    #[serde(default)]
    pub payload: Map<String, Value>,
    /// Opaque handle identifying the submitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originator: Option<String>,
    /// Message selector for intercepted dispatches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_message: Option<String>,
    /// Positional arguments of the original dispatch.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Query {
    /// Create a query with the given class and message text.
    pub fn new(class: QueryClass, message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("message".to_string(), Value::String(message.into()));
        Self {
            class,
            payload,
            originator: None,
            origin_message: None,
            args: Vec::new(),
        }
    }

    /// Build a DoesNotUnderstand query from an unresolved host dispatch.
    pub fn from_unresolved(
        message_name: impl Into<String>,
        receiver: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        let message_name = message_name.into();
        let mut payload = Map::new();
        payload.insert(
            "message".to_string(),
            Value::String(format!("unresolved message: {message_name}")),
        );
        payload.insert("receiver".to_string(), Value::String(receiver.into()));
        Self {
            class: QueryClass::DoesNotUnderstand,
            payload,
            originator: None,
            origin_message: Some(message_name),
            args,
        }
    }

    pub fn with_originator(mut self, originator: impl Into<String>) -> Self {
        self.originator = Some(originator.into());
        self
    }

    /// Permissive construction from untyped JSON: an unknown `kind` falls
    /// back to [`QueryClass::Generic`] instead of rejecting the submit.
    pub fn from_json(value: &Value) -> Self {
        let class = value
            .get("kind")
            .or_else(|| value.get("class"))
            .and_then(Value::as_str)
            .map(QueryClass::parse_or_generic)
            .unwrap_or_default();
        let payload = value
            .get("payload")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let originator = value
            .get("originator")
            .and_then(Value::as_str)
            .map(str::to_string);
        let origin_message = value
            .get("origin_message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let args = value
            .get("args")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self {
            class,
            payload,
            originator,
            origin_message,
            args,
        }
    }

    /// The query text, if present in the payload.
    pub fn message(&self) -> Option<&str> {
        self.payload.get("message").and_then(Value::as_str)
    }

    /// Query text or a stable placeholder for strategies that need one.
    pub fn message_or_default(&self) -> &str {
        self.message().unwrap_or("")
    }

    /// A query is well-formed when it carries a non-empty message or an
    /// origin message selector.
    pub fn is_well_formed(&self) -> bool {
        self.message().is_some_and(|m| !m.trim().is_empty())
            || self.origin_message.as_ref().is_some_and(|m| !m.is_empty())
    }
}

/// Context describing the calling environment of a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleContext(pub Map<String, Value>);

impl CycleContext {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// What triggered this cycle (user submit, unresolved dispatch, sub-goal
    /// escalation).
    pub fn trigger_source(&self) -> Option<&str> {
        self.get("trigger_source").and_then(Value::as_str)
    }

    /// Descriptor of the receiver for intercepted dispatches.
    pub fn receiver_descriptor(&self) -> Option<&str> {
        self.get("receiver").and_then(Value::as_str)
    }

    /// Link to a prior cycle this one descends from.
    pub fn prior_cycle(&self) -> Option<&str> {
        self.get("prior_cycle").and_then(Value::as_str)
    }
}
