use crate::bootstrap::records::daemon_records;
use crate::di::EngineServices;
use mdnsd_domain::Config;
use tracing::info;

pub async fn run_daemon(config: &Config, hostname: String) -> anyhow::Result<()> {
    info!(hostname = %hostname, interfaces = config.interfaces.len(), "Starting responder");

    let services = EngineServices::start(config, Some(hostname.clone())).await?;

    for record in daemon_records(config, &hostname)? {
        services.publish.publish(record).await?;
    }
    info!(services = config.services.len(), "Responder ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, sending goodbyes");

    services.stop().await;
    Ok(())
}
