//! Pool Manager
//!
//! Owns the worker handles, the round-robin cursor and the pending-query
//! correlation map. Callers get one async entry point, `dispatch`, which is
//! transparently parallelized across the fixed worker set.
//!
//! ## Guarantees
//! - **Single-flight initialization**: concurrent `initialize()` calls share
//!   one attempt; a failed attempt leaves the pool uninitialized for a retry.
//! - **Round robin**: sequential dispatches land on workers in strict cyclic
//!   order, regardless of how long individual queries run.
//! - **Correlation safety**: a pending entry is settled exactly once, by a
//!   matching response or by its timeout; late responses are dropped.

use super::protocol::{QueryRequest, QueryResponse};
use super::registry::HandlerRegistry;
use super::types::{PoolConfig, PoolError, QueryId};
use super::worker::{WorkerHandle, WorkerMessage, spawn_worker};

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};

/// Transient correlation record for one in-flight request. Created at
/// dispatch, removed exactly once — by the router on response or by the
/// dispatcher on timeout.
struct PendingQuery {
    query: String,
    resolver: oneshot::Sender<Result<serde_json::Value, PoolError>>,
}

/// Initialization state, guarded by an async mutex so that concurrent
/// callers await the same in-flight attempt instead of starting a second
/// pool.
#[derive(Default)]
struct PoolState {
    workers: Vec<WorkerHandle>,
    router: Option<tokio::task::JoinHandle<()>>,
}

/// The read-replica worker pool.
///
/// All mutable state lives on this object (no process-wide singletons), so
/// independent pools can coexist and tests can construct isolated instances.
pub struct QueryPool {
    config: PoolConfig,
    registry: Arc<HandlerRegistry>,
    state: Mutex<PoolState>,
    pending: Arc<DashMap<String, PendingQuery>>,
    cursor: AtomicUsize,
}

impl QueryPool {
    /// Creates an uninitialized pool. Workers start lazily on the first
    /// `dispatch()` (or an explicit `initialize()`).
    pub fn new(config: PoolConfig, registry: HandlerRegistry) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry: Arc::new(registry),
            state: Mutex::new(PoolState::default()),
            pending: Arc::new(DashMap::new()),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Starts the worker set if it is not already running.
    ///
    /// Idempotent: an initialized pool returns immediately. Every worker must
    /// signal readiness before the pool counts as initialized; if any fails,
    /// the started workers are torn down again and the error is returned,
    /// leaving the pool uninitialized so a later call can retry.
    pub async fn initialize(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        if !state.workers.is_empty() {
            return Ok(());
        }
        if self.config.worker_count == 0 {
            return Err(PoolError::Init("worker count must be at least 1".into()));
        }

        tracing::info!(
            "Starting {} catalog workers on {:?}",
            self.config.worker_count,
            self.config.db_path
        );

        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<QueryResponse>();
        let mut workers = Vec::with_capacity(self.config.worker_count);
        let mut readiness = Vec::with_capacity(self.config.worker_count);

        for worker_id in 0..self.config.worker_count {
            let (ready_tx, ready_rx) = oneshot::channel();
            match spawn_worker(
                worker_id,
                self.config.db_path.clone(),
                self.registry.clone(),
                reply_tx.clone(),
                ready_tx,
            ) {
                Ok(handle) => {
                    workers.push(handle);
                    readiness.push((worker_id, ready_rx));
                }
                Err(e) => {
                    Self::stop_workers(&mut workers);
                    return Err(PoolError::Init(format!("{e:#}")));
                }
            }
        }
        // Workers hold the only remaining senders; the router ends when the
        // last worker exits.
        drop(reply_tx);

        for (worker_id, ready_rx) in readiness {
            let failure = match ready_rx.await {
                Ok(signal) if signal.ready => None,
                Ok(signal) => Some(
                    signal
                        .error
                        .unwrap_or_else(|| "worker reported not ready".to_string()),
                ),
                Err(_) => Some("worker exited before signaling readiness".to_string()),
            };
            if let Some(message) = failure {
                Self::stop_workers(&mut workers);
                return Err(PoolError::Init(format!(
                    "worker {worker_id} failed to start: {message}"
                )));
            }
        }

        let pending = self.pending.clone();
        let router = tokio::spawn(async move {
            while let Some(response) = reply_rx.recv().await {
                Self::settle(&pending, response);
            }
        });

        state.workers = workers;
        state.router = Some(router);

        tracing::info!("Catalog pool initialized");
        Ok(())
    }

    /// Routes one worker reply to its pending caller. A reply whose entry has
    /// already been removed (timed out or shut down) is dropped silently.
    fn settle(pending: &DashMap<String, PendingQuery>, response: QueryResponse) {
        match pending.remove(&response.id) {
            Some((_, entry)) => {
                let outcome = match response.error {
                    Some(message) => Err(PoolError::Query {
                        query: entry.query,
                        message,
                    }),
                    None => Ok(response.result.unwrap_or(serde_json::Value::Null)),
                };
                if entry.resolver.send(outcome).is_err() {
                    tracing::debug!("Caller for query id {} went away", response.id);
                }
            }
            None => {
                tracing::debug!("Dropping orphaned response for query id {}", response.id);
            }
        }
    }

    /// Dispatches a named query to the next worker in round-robin order and
    /// awaits its result.
    ///
    /// Ensures the pool is initialized, registers a pending entry under a
    /// fresh correlation id, and settles it on response or timeout. The
    /// round-robin cursor is stateless with respect to load: a worker busy
    /// with an expensive query is not skipped.
    pub async fn dispatch(
        &self,
        query: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, PoolError> {
        self.initialize().await?;

        let sender = {
            let state = self.state.lock().await;
            if state.workers.is_empty() {
                return Err(PoolError::Shutdown);
            }
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % state.workers.len();
            state.workers[index].requests.clone()
        };

        let id = QueryId::new();
        let (resolver, settled) = oneshot::channel();
        self.pending.insert(
            id.0.clone(),
            PendingQuery {
                query: query.to_string(),
                resolver,
            },
        );

        let request = QueryRequest {
            id: id.0.clone(),
            query: query.to_string(),
            params,
        };
        if sender.send(WorkerMessage::Query(request)).is_err() {
            self.pending.remove(&id.0);
            return Err(PoolError::WorkerUnavailable(query.to_string()));
        }

        match tokio::time::timeout(self.config.query_timeout, settled).await {
            Ok(Ok(outcome)) => outcome,
            // Resolver dropped without settling: the pool was shut down.
            Ok(Err(_)) => Err(PoolError::Shutdown),
            Err(_) => {
                self.pending.remove(&id.0);
                tracing::warn!(
                    "Query '{}' timed out after {} ms",
                    query,
                    self.config.query_timeout.as_millis()
                );
                Err(PoolError::Timeout {
                    query: query.to_string(),
                    timeout_ms: self.config.query_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Stops every worker, rejects outstanding requests, and resets the
    /// round-robin cursor and initialization state so a subsequent
    /// `initialize()` starts a fresh pool.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if state.workers.is_empty() {
            return;
        }

        tracing::info!("Shutting down catalog pool ({} workers)", state.workers.len());
        Self::stop_workers(&mut state.workers);

        if let Some(router) = state.router.take() {
            // The router ends on its own once the last worker drops its reply
            // sender; abort covers the already-joined case.
            router.abort();
        }

        // Dropping the resolvers rejects any caller still awaiting.
        self.pending.clear();
        self.cursor.store(0, Ordering::Relaxed);
    }

    fn stop_workers(workers: &mut Vec<WorkerHandle>) {
        for worker in workers.iter() {
            let _ = worker.requests.send(WorkerMessage::Shutdown);
        }
        for worker in workers.drain(..) {
            if worker.thread.join().is_err() {
                tracing::warn!("Worker thread panicked during shutdown");
            }
        }
    }

    /// Number of distinct queries this pool can serve.
    pub fn handler_count(&self) -> usize {
        self.registry.handler_count()
    }

    /// Sorted names of the queries this pool can serve.
    pub fn query_names(&self) -> Vec<String> {
        self.registry.names()
    }
}
