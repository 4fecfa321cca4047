//! HTTP server for badge and health endpoints
//!
//! Provides:
//! - `/healthz` - Liveness probe (process is running)
//! - `/pods`, `/nodes` - shields.io endpoint badges
//!
//! Also provides the server lifecycle and graceful shutdown on SIGTERM/SIGINT.

mod lifecycle;
mod routes;
pub mod shutdown;

pub use lifecycle::{bind, serve, Lifecycle, LifecycleError, LifecyclePhase, DRAIN_TIMEOUT};
pub use routes::{build_router, AppState};
pub use shutdown::{shutdown_channel, wait_for_signal, ShutdownController, ShutdownSignal};

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_tests;

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
