use kube_badge::cluster::new_client;
use kube_badge::config::{load_dotenv, Config};
use kube_badge::server::{
    bind, build_router, serve, shutdown_channel, wait_for_signal, AppState, Lifecycle,
    DRAIN_TIMEOUT,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Install the JSON log subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            // Log the rejection in the same JSON format at the default level
            init_tracing(Config::default().log_level());
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    init_tracing(config.log_level());

    info!(
        environment = %config.environment,
        port = config.port,
        "Starting cluster badge server"
    );
    debug!(config = ?config, "Loaded configuration");

    let cluster = match new_client(&config).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create Kubernetes client");
            return Err(e.into());
        }
    };

    let lifecycle = Lifecycle::new();
    let listener = match bind(config.port).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Failed to bind listener");
            return Err(e.into());
        }
    };

    let app = build_router(AppState::new(Arc::new(cluster), &config));
    let (shutdown_controller, shutdown_signal) = shutdown_channel();

    // Serve on its own task so this one can wait for the signal
    let mut server = tokio::spawn(serve(
        listener,
        app,
        shutdown_signal.recv(),
        DRAIN_TIMEOUT,
        lifecycle.clone(),
    ));

    tokio::select! {
        signal = wait_for_signal() => match signal {
            Ok(name) => info!(signal = name, "Initiating graceful shutdown"),
            Err(e) => error!(error = %e, "Cannot wait for shutdown signals, shutting down"),
        },
        result = &mut server => {
            // Only a shutdown request may stop the server
            let err = match result {
                Ok(Ok(())) => anyhow::anyhow!("server stopped without a shutdown request"),
                Ok(Err(e)) => e.into(),
                Err(e) => e.into(),
            };
            error!(error = %err, "Server exited unexpectedly");
            return Err(err);
        }
    }

    shutdown_controller.shutdown();

    match server.await {
        Ok(Ok(())) => {
            info!(phase = ?lifecycle.phase(), "Badge server shut down gracefully");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Graceful shutdown failed");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Server task failed");
            Err(e.into())
        }
    }
}
