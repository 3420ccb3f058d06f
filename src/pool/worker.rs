//! Worker Execution Unit
//!
//! Each worker is one OS thread owning one read-only database connection and
//! a shared, immutable handler registry. It processes requests strictly one
//! at a time in arrival order, so there is no concurrency hazard inside a
//! unit; parallelism comes from running several units side by side.
//!
//! ## Lifecycle
//! 1. Open the connection read-only and apply best-effort tuning directives.
//! 2. Signal readiness exactly once.
//! 3. Loop: receive `{id, type, params}`, invoke the handler, reply
//!    `{id, result}` or `{id, error}` — failures (including panics) never
//!    cross the message boundary as anything but an error reply.

use super::protocol::{QueryRequest, QueryResponse, ReadySignal};
use super::registry::HandlerRegistry;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Messages accepted by a worker thread.
pub(crate) enum WorkerMessage {
    Query(QueryRequest),
    Shutdown,
}

/// Long-lived handle to one worker execution unit, owned by the pool.
/// Destroyed only on explicit pool shutdown; a crashed worker is not
/// restarted.
pub(crate) struct WorkerHandle {
    pub(crate) requests: crossbeam_channel::Sender<WorkerMessage>,
    pub(crate) thread: JoinHandle<()>,
}

/// Performance tuning applied at connection open. Each directive is
/// independent and non-fatal: several workers open the same file
/// concurrently and may legitimately contend on these.
const TUNING_DIRECTIVES: &[(&str, &str)] = &[
    ("cache_size", "PRAGMA cache_size = -64000;"),
    ("temp_store", "PRAGMA temp_store = MEMORY;"),
    ("mmap_size", "PRAGMA mmap_size = 268435456;"),
    ("page_size", "PRAGMA page_size = 4096;"),
    ("query_only", "PRAGMA query_only = 1;"),
];

/// Spawns one worker thread. The readiness outcome arrives on `ready`;
/// replies to dispatched queries arrive on `replies`.
pub(crate) fn spawn_worker(
    worker_id: usize,
    db_path: PathBuf,
    registry: Arc<HandlerRegistry>,
    replies: tokio::sync::mpsc::UnboundedSender<QueryResponse>,
    ready: tokio::sync::oneshot::Sender<ReadySignal>,
) -> Result<WorkerHandle> {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();

    let thread = std::thread::Builder::new()
        .name(format!("catalog-worker-{worker_id}"))
        .spawn(move || worker_main(worker_id, db_path, registry, rx, replies, ready))
        .with_context(|| format!("failed to spawn worker thread {worker_id}"))?;

    Ok(WorkerHandle {
        requests: tx,
        thread,
    })
}

fn worker_main(
    worker_id: usize,
    db_path: PathBuf,
    registry: Arc<HandlerRegistry>,
    requests: crossbeam_channel::Receiver<WorkerMessage>,
    replies: tokio::sync::mpsc::UnboundedSender<QueryResponse>,
    ready: tokio::sync::oneshot::Sender<ReadySignal>,
) {
    let conn = match open_readonly(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Worker {} failed to open {:?}: {:#}", worker_id, db_path, e);
            let _ = ready.send(ReadySignal::failed(format!("{e:#}")));
            return;
        }
    };

    apply_tuning(&conn, worker_id);

    if ready.send(ReadySignal::ok()).is_err() {
        // Pool gave up on initialization; nothing to serve.
        return;
    }
    tracing::info!("Worker {} ready ({} handlers)", worker_id, registry.handler_count());

    for message in requests.iter() {
        match message {
            WorkerMessage::Shutdown => break,
            WorkerMessage::Query(request) => {
                let response = execute(&conn, &registry, request);
                if replies.send(response).is_err() {
                    // Pool side is gone; stop serving.
                    break;
                }
            }
        }
    }

    tracing::info!("Worker {} stopped", worker_id);
}

fn open_readonly(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("opening catalog database {}", path.display()))?;
    Ok(conn)
}

fn apply_tuning(conn: &Connection, worker_id: usize) {
    for (name, sql) in TUNING_DIRECTIVES {
        if let Err(e) = conn.execute_batch(sql) {
            tracing::warn!(
                "Worker {}: tuning directive '{}' failed (non-fatal): {}",
                worker_id,
                name,
                e
            );
        }
    }
}

/// Runs one request to completion. Handler lookup misses, handler errors and
/// handler panics all become error replies; the worker keeps running.
fn execute(conn: &Connection, registry: &HandlerRegistry, request: QueryRequest) -> QueryResponse {
    let QueryRequest { id, query, params } = request;

    let Some(handler) = registry.get(&query) else {
        tracing::error!("Unknown query type: {}", query);
        return QueryResponse::err(id, format!("unknown query type: {query}"));
    };

    let outcome =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(conn, params)));

    match outcome {
        Ok(Ok(result)) => QueryResponse::ok(id, result),
        Ok(Err(e)) => {
            tracing::error!("Query '{}' failed: {:#}", query, e);
            QueryResponse::err(id, format!("{e:#}"))
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            tracing::error!("Query '{}' panicked: {}", query, message);
            QueryResponse::err(id, format!("query '{query}' panicked: {message}"))
        }
    }
}
