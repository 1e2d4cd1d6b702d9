//! The heartbeat loop: reload settings, evaluate today's targets, punch
//! when due, reschedule with jitter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use rand::Rng;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use punchbot_api::Portal;
use punchbot_config::{PortalSettings, ScheduleSettings, Settings};
use punchbot_types::PunchKind;

use crate::targets::{DailyTargets, is_workday};

/// Default wake-up gap between ticks.
const SHORT_GAP: Duration = Duration::from_secs(60);
/// Relaxed gap when nothing can happen for a while.
const LONG_GAP: Duration = Duration::from_secs(60 * 60);

/// What a tick decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPlan {
    /// A punch is due now.
    Punch(PunchKind),
    /// Both actions satisfied; relax until the day changes.
    Done,
    /// Nothing due yet; wake up again soon.
    Wait,
}

/// Decide what to do given today's targets and the current time.
///
/// Check-in and check-out are an `else if` pair: when both are overdue in
/// the same tick (e.g. after a long outage) only the check-in runs, and
/// the check-out is picked up on the following tick.
pub fn plan(targets: &DailyTargets, now: DateTime<Local>) -> TickPlan {
    if !targets.check_in_done && now >= targets.check_in {
        TickPlan::Punch(PunchKind::In)
    } else if !targets.check_out_done && now >= targets.check_out {
        TickPlan::Punch(PunchKind::Out)
    } else if targets.check_out_done {
        TickPlan::Done
    } else {
        TickPlan::Wait
    }
}

/// Outcome of a one-shot guarded punch.
#[derive(Debug)]
pub enum PunchOutcome {
    /// The portal already has this event; nothing was submitted.
    AlreadyRecorded,
    /// The event was submitted; the portal's result object verbatim.
    Submitted(Value),
}

/// Log in, re-check the remote record, and punch only if the portal has no
/// entry yet. Drives the manual `punch` command.
pub async fn punch_once(
    portal: &dyn Portal,
    settings: &PortalSettings,
    kind: PunchKind,
) -> anyhow::Result<PunchOutcome> {
    portal.login(settings).await?;
    let record = portal.attendance(settings).await?;
    if record.has(kind) {
        return Ok(PunchOutcome::AlreadyRecorded);
    }
    let result = portal.punch(settings, kind).await?;
    Ok(PunchOutcome::Submitted(result))
}

/// The self-rescheduling heartbeat driver.
///
/// One tick runs at a time; targets and session state have no concurrent
/// writer by construction.
pub struct Heartbeat {
    portal: Arc<dyn Portal>,
    config_path: PathBuf,
    targets: Option<DailyTargets>,
}

impl Heartbeat {
    pub fn new(portal: Arc<dyn Portal>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            portal,
            config_path: config_path.into(),
            targets: None,
        }
    }

    /// Run ticks until `cancel` fires. Each tick computes the next gap,
    /// then the loop sleeps it plus a 0–3 s jitter so wake-ups never align
    /// with the portal's clock.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Heartbeat loop started");
        loop {
            // Cancellation wins even mid-tick: the in-flight request is
            // dropped and the next start re-derives truth from the portal.
            let gap = tokio::select! {
                _ = cancel.cancelled() => break,
                gap = self.tick(Local::now()) => gap,
            };
            let jitter = Duration::from_secs(rand::thread_rng().gen_range(0..=3));
            debug!(
                gap_secs = gap.as_secs(),
                jitter_secs = jitter.as_secs(),
                "Next wake-up scheduled"
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(gap + jitter) => {}
            }
        }
        info!("Heartbeat loop stopped");
    }

    /// One heartbeat. Every failure path is absorbed here so the loop
    /// always reaches its reschedule step; returns the gap to sleep before
    /// the next tick.
    pub async fn tick(&mut self, now: DateTime<Local>) -> Duration {
        let settings = match Settings::load(&self.config_path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Settings reload failed, skipping tick: {e}");
                return SHORT_GAP;
            }
        };
        let schedule = match settings.schedule() {
            Ok(schedule) => schedule,
            Err(e) => {
                error!("Schedule settings invalid, skipping tick: {e}");
                return SHORT_GAP;
            }
        };

        if !is_workday(now.date_naive(), &schedule.workdays) {
            info!("Not a workday, relaxing");
            return LONG_GAP;
        }

        let today = self.refresh_targets(now, &schedule);
        match plan(&today, now) {
            TickPlan::Punch(kind) => {
                let portal_settings = match settings.portal() {
                    Ok(portal_settings) => portal_settings,
                    Err(e) => {
                        error!("Portal settings invalid, skipping tick: {e}");
                        return SHORT_GAP;
                    }
                };
                self.execute(kind, &portal_settings).await;
                SHORT_GAP
            }
            TickPlan::Done => {
                info!("Already checked out today, relaxing");
                LONG_GAP
            }
            TickPlan::Wait => {
                info!(
                    check_in = %today.check_in.format("%H:%M:%S"),
                    check_out = %today.check_out.format("%H:%M:%S"),
                    "Waiting for next target"
                );
                SHORT_GAP
            }
        }
    }

    /// Current targets, lazily regenerated the first time a tick observes
    /// a new local day. Stable across ticks within the same day.
    fn refresh_targets(&mut self, now: DateTime<Local>, schedule: &ScheduleSettings) -> DailyTargets {
        let day = now.date_naive();
        match &self.targets {
            Some(targets) if targets.day == day => targets.clone(),
            _ => {
                let fresh = DailyTargets::generate(day, schedule, &mut rand::thread_rng());
                info!(
                    day = %fresh.day,
                    check_in = %fresh.check_in.format("%H:%M:%S"),
                    check_out = %fresh.check_out.format("%H:%M:%S"),
                    "Generated new daily targets"
                );
                self.targets = Some(fresh.clone());
                fresh
            }
        }
    }

    /// Re-check the remote record, then punch if the portal has no entry
    /// yet. A failed attendance query triggers one re-login; a failed
    /// login aborts the tick without punching. Punch failures are logged
    /// and the loop carries on — the next tick re-derives truth from the
    /// remote record.
    async fn execute(&mut self, kind: PunchKind, settings: &PortalSettings) {
        let record = match self.portal.attendance(settings).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Attendance query failed, re-authenticating: {e}");
                match self.portal.login(settings).await {
                    // A second query failure counts as the empty record and
                    // the punch below proceeds.
                    Ok(_) => self.portal.attendance(settings).await.unwrap_or_default(),
                    Err(e) => {
                        error!("Login failed, aborting tick: {e}");
                        return;
                    }
                }
            }
        };

        debug!(kind = kind.as_str(), ?record, "Executing punch task");

        if record.has(kind) {
            info!(kind = kind.as_str(), "Already recorded on the portal, skipping");
            self.mark_done(kind);
            return;
        }

        match self.portal.punch(settings, kind).await {
            Ok(result) => info!(kind = kind.as_str(), "Punch result: {result}"),
            Err(e) => warn!(kind = kind.as_str(), "Punch failed: {e}"),
        }
    }

    fn mark_done(&mut self, kind: PunchKind) {
        if let Some(targets) = &mut self.targets {
            match kind {
                PunchKind::In => targets.check_in_done = true,
                PunchKind::Out => targets.check_out_done = true,
            }
        }
    }
}
