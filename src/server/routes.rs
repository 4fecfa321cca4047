//! Badge and liveness endpoints
//!
//! - `/healthz` - Liveness: is the process alive? Never touches the cluster.
//! - `/pods` - Badge for healthy pods across all namespaces
//! - `/nodes` - Badge for ready nodes
//!
//! Every request is logged by a `TraceLayer`; a panicking handler is turned
//! into a 500 by `CatchPanicLayer` and the server keeps running.

use crate::aggregate::{aggregate, is_node_healthy, PodHealth};
use crate::badge::{label, Badge};
use crate::cluster::{ClusterError, ClusterSource};
use crate::config::Config;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, Level};

/// Shared state for the badge handlers
///
/// The cluster handle is created once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    cluster: Arc<dyn ClusterSource>,
    environment: Arc<str>,
    pod_health: Arc<PodHealth>,
}

impl AppState {
    pub fn new(cluster: Arc<dyn ClusterSource>, config: &Config) -> Self {
        Self {
            cluster,
            environment: Arc::from(config.environment.as_str()),
            pod_health: Arc::new(PodHealth::new(config.pod_healthy_phases.iter().cloned())),
        }
    }
}

/// Liveness probe handler
///
/// Always returns 200 with `"ok"`. HEAD is answered from the GET route.
async fn healthz() -> Json<&'static str> {
    Json("ok")
}

async fn pods(State(state): State<AppState>) -> Response {
    let pods = match state.cluster.list_pods().await {
        Ok(pods) => pods,
        Err(e) => return query_failed(e),
    };

    let result = aggregate(&pods, |pod| state.pod_health.is_healthy(pod));
    debug!(
        healthy = result.healthy,
        total = result.total,
        color = ?result.color,
        "Aggregated pod health"
    );

    Json(Badge::new(label("pods", &state.environment), &result)).into_response()
}

async fn nodes(State(state): State<AppState>) -> Response {
    let nodes = match state.cluster.list_nodes().await {
        Ok(nodes) => nodes,
        Err(e) => return query_failed(e),
    };

    let result = aggregate(&nodes, is_node_healthy);
    debug!(
        healthy = result.healthy,
        total = result.total,
        color = ?result.color,
        "Aggregated node health"
    );

    Json(Badge::new(label("nodes", &state.environment), &result)).into_response()
}

/// 500 with the error text as a JSON string
fn query_failed(err: ClusterError) -> Response {
    error!(error = %err, "Cluster query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(err.to_string())).into_response()
}

/// Build the router with request logging and panic recovery
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/pods", get(pods))
        .route("/nodes", get(nodes))
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
