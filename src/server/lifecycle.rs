//! Server lifecycle: Starting -> Running -> Draining -> Stopped
//!
//! ```text
//! Starting --bind ok--> Running --shutdown--> Draining --drained--> Stopped
//!    |                     |                     |
//!    bind error (fatal)    serve error (fatal)   drain timeout (fatal)
//! ```
//!
//! `serve` takes any shutdown future, so draining and the drain deadline can
//! be driven from tests without delivering a real signal.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

/// How long in-flight requests may run once draining starts
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Starting,
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("requests still in flight after {0:?} drain timeout")]
    DrainTimeout(Duration),
}

/// Observable lifecycle phase, shared between the server task and callers
#[derive(Clone)]
pub struct Lifecycle {
    sender: Arc<watch::Sender<LifecyclePhase>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(LifecyclePhase::Starting);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.sender.borrow()
    }

    /// Wait until the lifecycle reaches `phase`
    pub async fn reached(&self, phase: LifecyclePhase) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = receiver.wait_for(|current| *current == phase).await;
    }

    fn advance(&self, phase: LifecyclePhase) {
        let previous = self.sender.send_replace(phase);
        info!(from = ?previous, to = ?phase, "Lifecycle transition");
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind the listen socket on all interfaces
///
/// The lifecycle stays in `Starting`; a bind error is startup-fatal.
pub async fn bind(port: u16) -> Result<TcpListener, LifecycleError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| LifecycleError::Bind { addr, source })?;
    info!(port = %port, "Listener bound");
    Ok(listener)
}

/// Serve `app` until `shutdown` resolves, then drain for at most `drain_timeout`
///
/// Returns once every connection has finished, or with
/// `LifecycleError::DrainTimeout` when in-flight requests outlive the window.
/// Connections still running at that point are abandoned to the runtime.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
    lifecycle: Lifecycle,
) -> Result<(), LifecycleError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (drain_tx, mut drain_started) = oneshot::channel();
    let drain_lifecycle = lifecycle.clone();
    let graceful = async move {
        shutdown.await;
        drain_lifecycle.advance(LifecyclePhase::Draining);
        let _ = drain_tx.send(());
    };

    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Badge server listening (HTTP)");
    }
    lifecycle.advance(LifecyclePhase::Running);

    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .await
    };
    tokio::pin!(server);

    // Run until the server exits on its own or draining begins
    let finished = tokio::select! {
        biased;
        result = &mut server => Some(result),
        _ = &mut drain_started => None,
    };

    let result = match finished {
        Some(result) => result.map_err(LifecycleError::Serve),
        None => match tokio::time::timeout(drain_timeout, server).await {
            Ok(result) => result.map_err(LifecycleError::Serve),
            Err(_) => {
                warn!(timeout = ?drain_timeout, "Drain deadline exceeded, abandoning requests");
                Err(LifecycleError::DrainTimeout(drain_timeout))
            }
        },
    };

    lifecycle.advance(LifecyclePhase::Stopped);
    result
}
