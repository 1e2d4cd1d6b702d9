//! Randomized daily punch targets and workday evaluation.

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime};
use rand::Rng;

use punchbot_config::ScheduleSettings;

/// Punch targets for one local calendar day.
///
/// Regenerated the first time a tick observes a new day; the done flags
/// persist across ticks within the same day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTargets {
    pub day: NaiveDate,
    /// Instant at or after which the check-in should be attempted.
    pub check_in: DateTime<Local>,
    pub check_out: DateTime<Local>,
    pub check_in_done: bool,
    pub check_out_done: bool,
}

impl DailyTargets {
    /// Compute fresh targets for `day`: each nominal time plus an
    /// independent uniform offset in `[0, window)` minutes. A zero window
    /// yields exactly the nominal instant.
    ///
    /// The offsets exist so the portal never sees a fixed-time pattern.
    pub fn generate(day: NaiveDate, schedule: &ScheduleSettings, rng: &mut impl Rng) -> Self {
        let check_in =
            at_local(day, schedule.check_in) + random_offset(schedule.check_in_window_min, rng);
        let check_out =
            at_local(day, schedule.check_out) + random_offset(schedule.check_out_window_min, rng);
        Self {
            day,
            check_in,
            check_out,
            check_in_done: false,
            check_out_done: false,
        }
    }
}

/// Whether `day` is in the configured workday set.
/// Weekday numbers use the portal's convention: 0 = Sunday .. 6 = Saturday.
pub fn is_workday(day: NaiveDate, workdays: &[u32]) -> bool {
    workdays.contains(&day.weekday().num_days_from_sunday())
}

fn at_local(day: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = day.and_time(time);
    match naive.and_local_timezone(Local) {
        LocalResult::Single(instant) | LocalResult::Ambiguous(instant, _) => instant,
        // A nominal time inside a DST gap does not exist; shift forward an
        // hour to the first valid instant.
        LocalResult::None => (naive + Duration::hours(1))
            .and_local_timezone(Local)
            .earliest()
            .unwrap_or_else(Local::now),
    }
}

/// Uniform offset in `[0, window_min)` minutes, millisecond granularity.
fn random_offset(window_min: u32, rng: &mut impl Rng) -> Duration {
    let window_ms = i64::from(window_min) * 60_000;
    if window_ms == 0 {
        return Duration::zero();
    }
    Duration::milliseconds(rng.gen_range(0..window_ms))
}
