//! Dispatcher Module
//!
//! Fixed-size worker pool that owns the listening socket and the lifecycle
//! of request handling.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tracing::{debug, info, warn};

// == Dispatcher State ==
/// Lifecycle of a dispatcher instance.
///
/// Transitions: Stopped -> Starting -> Running -> Stopping -> Stopped.
/// A failed bind during Starting reverts straight to Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

// == Dispatch Error ==
/// Failure starting the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The listening endpoint could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// start() was called while not Stopped
    #[error("Dispatcher is already running")]
    AlreadyRunning,
}

// == Dispatcher ==
/// Accepts connections on a fixed pool of workers.
///
/// Each worker runs an independent accept loop on the shared listener and
/// serves exactly one HTTP/1 exchange per connection with keep-alive
/// disabled, then closes it and accepts the next. Total concurrency is
/// bounded by the pool size; once every worker is busy, new connections
/// wait in the listen backlog.
///
/// Workers block only while accepting and while reading a request; the
/// operation itself (including the backing-store call) runs synchronously
/// on the worker that accepted the connection.
pub struct Dispatcher {
    router: Router,
    pool_size: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    state: DispatcherState,
    shutdown: Option<watch::Sender<bool>>,
    workers: Vec<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl Dispatcher {
    // == Constructor ==
    /// Creates a dispatcher serving `router` with `pool_size` workers.
    ///
    /// # Panics
    /// Panics if `pool_size` is zero.
    pub fn new(router: Router, pool_size: usize) -> Self {
        assert!(pool_size > 0, "Pool size must be greater than 0");
        Self {
            router,
            pool_size,
            inner: Mutex::new(Inner {
                state: DispatcherState::Stopped,
                shutdown: None,
                workers: Vec::new(),
                local_addr: None,
            }),
        }
    }

    // == Start ==
    /// Binds the listening endpoint and spawns the worker pool.
    ///
    /// Returns the bound address (useful with port 0). Fails if the
    /// dispatcher is not Stopped or the endpoint cannot be bound; on a bind
    /// failure the state reverts to Stopped.
    pub async fn start(&self, addr: SocketAddr) -> Result<SocketAddr, DispatchError> {
        {
            let mut inner = self.inner.lock();
            if inner.state != DispatcherState::Stopped {
                return Err(DispatchError::AlreadyRunning);
            }
            inner.state = DispatcherState::Starting;
        }

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                self.inner.lock().state = DispatcherState::Stopped;
                return Err(DispatchError::Bind { addr, source });
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(local_addr) => local_addr,
            Err(source) => {
                self.inner.lock().state = DispatcherState::Stopped;
                return Err(DispatchError::Bind { addr, source });
            }
        };

        let listener = Arc::new(listener);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut workers = Vec::with_capacity(self.pool_size);
        for id in 0..self.pool_size {
            workers.push(tokio::spawn(worker_loop(
                id,
                Arc::clone(&listener),
                self.router.clone(),
                shutdown_rx.clone(),
            )));
        }

        let mut inner = self.inner.lock();
        inner.state = DispatcherState::Running;
        inner.shutdown = Some(shutdown_tx);
        inner.workers = workers;
        inner.local_addr = Some(local_addr);

        info!(
            "Dispatcher listening on {} with {} workers",
            local_addr, self.pool_size
        );
        Ok(local_addr)
    }

    // == Stop ==
    /// Stops accepting, waits for every worker to finish its current
    /// connection, and releases the listening endpoint.
    ///
    /// Idempotent: stopping an already-stopped dispatcher is a no-op.
    pub async fn stop(&self) {
        let (shutdown, workers) = {
            let mut inner = self.inner.lock();
            match inner.state {
                DispatcherState::Stopped | DispatcherState::Stopping => return,
                DispatcherState::Starting | DispatcherState::Running => {}
            }
            inner.state = DispatcherState::Stopping;
            (inner.shutdown.take(), std::mem::take(&mut inner.workers))
        };

        if let Some(shutdown) = shutdown {
            // Unblocks every accept; workers drain their current connection
            // and exit. The listener closes when the last worker drops it.
            let _ = shutdown.send(true);
        }
        for worker in workers {
            if let Err(err) = worker.await {
                warn!("Worker task failed: {}", err);
            }
        }

        let mut inner = self.inner.lock();
        inner.state = DispatcherState::Stopped;
        inner.local_addr = None;
        info!("Dispatcher stopped");
    }

    // == Accessors ==
    /// Returns the current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.inner.lock().state
    }

    /// Returns the bound address while Running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().local_addr
    }
}

// == Worker Loop ==
/// One pool slot: accept a connection, serve it to completion, repeat.
async fn worker_loop(
    id: usize,
    listener: Arc<TcpListener>,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("Worker {} accepting connections", id);

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok(connection) => connection,
                Err(err) => {
                    if *shutdown.borrow() {
                        break;
                    }
                    warn!("Worker {} failed to accept connection: {}", id, err);
                    continue;
                }
            },
        };

        debug!("Worker {} serving connection from {}", id, peer);
        if let Err(err) = serve_connection(stream, router.clone()).await {
            debug!("Worker {} connection from {} ended with error: {}", id, peer, err);
        }
    }

    debug!("Worker {} exited", id);
}

/// Serves a single request/response exchange and closes the connection.
async fn serve_connection(stream: TcpStream, router: Router) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
        router.clone().oneshot(request)
    });

    // Keep-alive off: one operation per connection.
    http1::Builder::new()
        .keep_alive(false)
        .serve_connection(io, service)
        .await
}
