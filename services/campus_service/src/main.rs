use std::time::Duration;

use campus_service::context::{Context, Settings};
use campus_service::notifications::Notifier;
use campus_service::pb::campus_service_server::CampusServiceServer;
use campus_service::svc::CampusServiceImpl;
use service_core::telemetry::{init_subscriber, make_subscriber};
use tonic::transport::Server;

const NOTIFIER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = make_subscriber(env!("CARGO_PKG_NAME"), "info");
    init_subscriber(subscriber)?;

    let settings = Settings::from_env()?;
    let (ctx, events) = Context::from_settings(&settings).await?;
    let notifier = Notifier::new(ctx.store.clone()).spawn(events);

    tracing::info!(addr = %settings.listen_addr, backend = ?settings.store_backend, "Starting campus service.");
    let server = CampusServiceServer::new(CampusServiceImpl::new(ctx));
    Server::builder()
        .add_service(server)
        .serve_with_shutdown(settings.listen_addr, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Failed to listen for shutdown signal.");
            }
        })
        .await?;

    // The server owned the last event bus handle, so the notifier drains what is left and stops.
    match tokio::time::timeout(NOTIFIER_DRAIN_TIMEOUT, notifier).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "Notifier task failed."),
        Err(_) => tracing::warn!("Notifier did not drain in time, pending notifications are lost."),
    }
    tracing::info!("Campus service stopped.");
    Ok(())
}
