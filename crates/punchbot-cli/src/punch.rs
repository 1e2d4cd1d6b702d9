use std::path::PathBuf;

use anyhow::Result;

use punchbot_api::PortalClient;
use punchbot_config::Settings;
use punchbot_scheduler::{PunchOutcome, punch_once};
use punchbot_types::PunchKind;

/// One-shot manual punch, guarded by the same remote-record check as the
/// heartbeat path.
pub async fn run_punch(kind: PunchKind, config: PathBuf) -> Result<()> {
    let settings = Settings::load(&config)?;
    let portal_settings = settings.portal()?;

    let portal = PortalClient::new();
    match punch_once(&portal, &portal_settings, kind).await? {
        PunchOutcome::AlreadyRecorded => {
            println!("{} already recorded on the portal, nothing to do", kind.as_str());
        }
        PunchOutcome::Submitted(result) => println!("{result}"),
    }

    Ok(())
}
