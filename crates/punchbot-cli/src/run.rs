use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use punchbot_api::PortalClient;
use punchbot_scheduler::Heartbeat;

/// Run the heartbeat agent until interrupted.
pub async fn run_agent(config: PathBuf) -> Result<()> {
    info!(config = %config.display(), "Starting attendance agent");

    let portal = Arc::new(PortalClient::new());
    let heartbeat = Heartbeat::new(portal, config);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping agent");
            signal_cancel.cancel();
        }
    });

    heartbeat.run(cancel).await;
    Ok(())
}
