//! Worker Message Protocol
//!
//! Defines the three message shapes that cross the pool/worker boundary:
//! tagged requests, tagged responses, and the one-shot readiness signal.
//! Workers see nothing else; callers see none of this (they use the typed
//! client functions).

use serde::{Deserialize, Serialize};

/// A request dispatched to one worker: `{id, type, params}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Correlation identifier, unique among in-flight requests.
    pub id: String,
    /// Name of the registered handler to invoke.
    #[serde(rename = "type")]
    pub query: String,
    /// Already-deserialized parameters, passed to the handler as-is.
    pub params: serde_json::Value,
}

/// A worker's reply: `{id, result}` on success, `{id, error}` on failure.
/// Exactly one of the two optional fields is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn ok(id: String, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: String, message: String) -> Self {
        Self {
            id,
            result: None,
            error: Some(message),
        }
    }
}

/// Sent by a worker exactly once, after its connection is open and tuned,
/// before it accepts any query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadySignal {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadySignal {
    pub fn ok() -> Self {
        Self {
            ready: true,
            error: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            ready: false,
            error: Some(message),
        }
    }
}
