//! Query Handler Registry
//!
//! A closed registry mapping query names (e.g. "categories_with_previews")
//! to synchronous read handlers over a worker's database connection. The
//! registry is built once, before the pool starts, and shared read-only by
//! every worker — the set of supported operations is enumerable instead of
//! being buried in dispatch branches.

use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;

/// Type alias for a registered query handler.
///
/// Handlers are pure read functions: they take already-deserialized
/// parameters, run parameterized queries against the worker's connection,
/// and return a JSON-serializable result. They run one at a time within a
/// worker, so they need no internal synchronization.
pub type QueryHandlerFn =
    Arc<dyn Fn(&Connection, serde_json::Value) -> Result<serde_json::Value> + Send + Sync>;

/// Registry holding the mapping between query names and their implementation.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, QueryHandlerFn>,
}

impl HandlerRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a query name. Registration happens during
    /// registry construction only; workers never mutate the registry.
    pub fn register<F>(&mut self, query_name: &str, handler: F)
    where
        F: Fn(&Connection, serde_json::Value) -> Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.handlers
            .insert(query_name.to_string(), Arc::new(handler));

        tracing::debug!("Registered query handler: {}", query_name);
    }

    /// Looks up a handler by query name.
    pub fn get(&self, query_name: &str) -> Option<&QueryHandlerFn> {
        self.handlers.get(query_name)
    }

    /// Checks if a handler is registered.
    pub fn has_handler(&self, query_name: &str) -> bool {
        self.handlers.contains_key(query_name)
    }

    /// Returns a sorted list of all registered query names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
