use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed number of worker execution units a pool starts by default.
///
/// The pool parallelizes read-only lookups, not bulk work; a small fixed
/// count is enough and keeps the per-worker page caches warm.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Default per-request timeout. A request that has not been answered within
/// this window rejects at the caller; the worker is left alone.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Unique identifier correlating one request with its response across the
/// worker message boundary.
///
/// Wrapper around a UUID string. Uniqueness among in-flight requests is all
/// that is required; responses are matched purely by this value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QueryId(pub String);

impl QueryId {
    /// Generates a new random UUID v4-based QueryId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Static configuration for one pool instance.
///
/// The database path is resolved once by the embedding process (conventionally
/// relative to its working directory); worker count and timeout are fixed for
/// the pool's lifetime.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Path to the read-only catalog database file.
    pub db_path: PathBuf,
    /// Number of worker execution units to start.
    pub worker_count: usize,
    /// How long a dispatched query may stay unanswered before rejecting.
    pub query_timeout: Duration,
}

impl PoolConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            worker_count: DEFAULT_WORKER_COUNT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Everything that can go wrong between `dispatch()` and a settled result.
///
/// Failures are surfaced to the immediate caller; nothing is retried at this
/// layer.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The worker replied with an error: an unknown query type or a handler
    /// that raised. The worker itself survives.
    #[error("query '{query}' failed: {message}")]
    Query { query: String, message: String },

    /// No response arrived within the configured window. The worker is not
    /// notified; a late response is silently dropped.
    #[error("query '{query}' timed out after {timeout_ms} ms")]
    Timeout { query: String, timeout_ms: u64 },

    /// A worker failed to start or to signal readiness. The pool stays
    /// uninitialized and a later `initialize()` may retry.
    #[error("worker pool failed to initialize: {0}")]
    Init(String),

    /// The request could not be handed to the selected worker (its request
    /// channel is disconnected, typically because the thread died).
    #[error("no worker available for query '{0}'")]
    WorkerUnavailable(String),

    /// The pool was shut down while the request was in flight, or dispatch
    /// was attempted against a pool with no workers.
    #[error("worker pool is shut down")]
    Shutdown,

    /// The worker's reply did not decode into the caller's expected type.
    #[error("failed to decode result for query '{query}': {message}")]
    Decode { query: String, message: String },
}
