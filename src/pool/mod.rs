//! Read-Replica Worker Pool
//!
//! A fixed set of worker execution units, each owning one independent
//! read-only database connection, fronted by a manager that dispatches named
//! queries round-robin and correlates asynchronous request/response pairs.
//!
//! ## Architecture Overview
//! 1. **Dispatch**: a caller invokes `QueryPool::dispatch(name, params)`. The
//!    pool lazily initializes its workers (single-flight), picks the next
//!    worker by a monotonically advancing counter modulo worker count, and
//!    registers a pending entry under a fresh correlation id.
//! 2. **Execution**: the chosen worker looks the name up in its handler
//!    registry and runs the handler against its own connection, one request
//!    at a time.
//! 3. **Correlation**: the worker posts back a tagged response; a router task
//!    matches it to the pending entry and settles the caller's future. If the
//!    per-request timeout fired first, the late response is dropped.
//!
//! ## Submodules
//! - **`manager`**: pool lifecycle, round-robin dispatch, correlation map.
//! - **`worker`**: the per-thread execution unit and its connection tuning.
//! - **`registry`**: the closed mapping from query names to read handlers.
//! - **`protocol`**: the request/response/readiness message shapes.
//! - **`types`**: configuration, correlation ids, the error taxonomy.

pub mod manager;
pub mod protocol;
pub mod registry;
pub mod types;
pub(crate) mod worker;
