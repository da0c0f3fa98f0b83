//! SecurityGroup controller
//!
//! Watches SecurityGroup resources and triggers reconciliation.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::{
    api::ListParams,
    runtime::{
        controller::{Action, Controller},
        watcher::Config as WatcherConfig,
    },
    Api, Client, ResourceExt,
};
use tracing::{error, info, instrument};

use crate::controllers::Context;
use crate::crd::SecurityGroup;
use crate::error::{Error, Result};
use crate::metrics;
use crate::store::ObjectKey;

/// Run the SecurityGroup controller
pub async fn run(client: Client, context: Arc<Context>) {
    let api: Api<SecurityGroup> = match &context.config.watch_namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    // Verify CRD is installed
    if let Err(e) = api.list(&ListParams::default().limit(1)).await {
        error!("SecurityGroup CRD not installed: {}", e);
        return;
    }

    info!("Starting SecurityGroup controller");

    Controller::new(api, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    info!(
                        name = %obj.name,
                        namespace = obj.namespace.as_deref().unwrap_or("default"),
                        "Reconciled SecurityGroup"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation error");
                    metrics::RECONCILIATION_ERRORS
                        .with_label_values(&["SecurityGroup"])
                        .inc();
                }
            }
        })
        .await;
}

/// Main reconciliation function
#[instrument(skip(obj, ctx), fields(name = %obj.name_any(), namespace = obj.namespace()))]
async fn reconcile(obj: Arc<SecurityGroup>, ctx: Arc<Context>) -> Result<Action> {
    let _timer = metrics::RECONCILE_DURATION
        .with_label_values(&["SecurityGroup"])
        .start_timer();
    metrics::RECONCILIATIONS
        .with_label_values(&["SecurityGroup"])
        .inc();

    // The reconciler re-reads the record, the event only names it
    ctx.reconciler.reconcile(&ObjectKey::of(&obj)).await?;

    Ok(Action::await_change())
}

/// Error policy for the controller
fn error_policy(obj: Arc<SecurityGroup>, error: &Error, _ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    error!(
        name = %name,
        error = %error,
        "Reconciliation failed, scheduling retry"
    );

    Action::requeue(requeue_after(error))
}

/// Requeue delay by error type
fn requeue_after(error: &Error) -> Duration {
    match error {
        // Stale write, the record changed under us
        _ if error.is_conflict() => Duration::from_secs(5),
        Error::Kube(_) | Error::Store(_) => Duration::from_secs(30),
        Error::Adapter(_) => Duration::from_secs(30),
        Error::Config(_) => Duration::from_secs(300),
        _ => Duration::from_secs(30),
    }
}
