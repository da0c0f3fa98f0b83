//! Security Group Kubernetes Operator
//!
//! Main entry point for the operator. Loads configuration, sets up the
//! Kubernetes and DCS clients, and runs the SecurityGroup reconciliation loop.

use std::sync::Arc;

use kube::Client;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use security_group_operator::{
    adapters::DcsClient,
    config::OperatorConfig,
    controllers::{self, Context},
    metrics,
    reconcilers::{Reconciler, ReconcilerOptions},
    store::KubeStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Security Group Operator");

    let config = OperatorConfig::from_env()?;
    info!(
        api_url = %config.api_url,
        namespace = config.watch_namespace.as_deref().unwrap_or("*"),
        spec_changing = ?config.spec_changing,
        "Loaded configuration"
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let dcs = DcsClient::new(config.api_url.clone(), config.api_timeout)?;
    let reconciler = Reconciler::new(
        Arc::new(KubeStore::new(client.clone())),
        Arc::new(dcs),
        ReconcilerOptions {
            spec_changing: config.spec_changing,
        },
    );

    let metrics_port = config.metrics_port;
    let context = Arc::new(Context::new(reconciler, config));

    let metrics_handle = tokio::spawn(metrics::serve(metrics_port));
    info!("Metrics server starting on port {}", metrics_port);

    let controller = controllers::run_security_group_controller(client, context);

    tokio::select! {
        _ = controller => {
            error!("SecurityGroup controller exited unexpectedly");
            metrics::OPERATOR_HEALTH.set(0.0);
        }
        _ = metrics_handle => {
            error!("Metrics server exited unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, stopping operator");
        }
    }

    info!("Security Group Operator stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kube=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
