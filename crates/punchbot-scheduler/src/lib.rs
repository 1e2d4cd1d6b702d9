//! punchbot-scheduler: randomized daily targets and the heartbeat loop
//! that drives the portal.

pub mod heartbeat;
pub mod targets;

pub use heartbeat::{Heartbeat, PunchOutcome, TickPlan, plan, punch_once};
pub use targets::{DailyTargets, is_workday};
