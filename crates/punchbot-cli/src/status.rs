use std::path::PathBuf;

use anyhow::Result;

use punchbot_api::{Portal, PortalClient};
use punchbot_config::Settings;

/// One-shot status: authenticate and print today's attendance record.
pub async fn run_status(config: PathBuf) -> Result<()> {
    let settings = Settings::load(&config)?;
    let portal_settings = settings.portal()?;

    let portal = PortalClient::new();
    let profile = portal.login(&portal_settings).await?;
    let record = portal.attendance(&portal_settings).await?;

    println!("Signed in as {}", profile.last_name);
    println!(
        "  check-in:  {}",
        record.starttime.as_deref().unwrap_or("not recorded")
    );
    println!(
        "  check-out: {}",
        record.endtime.as_deref().unwrap_or("not recorded")
    );

    Ok(())
}
