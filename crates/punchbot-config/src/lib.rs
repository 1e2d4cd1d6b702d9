//! Flat `key=value` settings for the punch agent.
//!
//! The settings file is line-oriented text: `key=value` pairs, lines whose
//! first non-blank character is `;` or `#` are comments, and one layer of
//! matching single or double quotes is stripped from values. The file is
//! re-read on every heartbeat tick so it can be edited while the agent
//! runs.
//!
//! ```ini
//! url_api=https://hr.example.co.jp/api
//! url_referer=https://hr.example.co.jp
//! agent="Mozilla/5.0 (X11; Linux x86_64)"
//! id=emp-1024
//! password=secret
//! address=1-2-3 Chiyoda, Tokyo
//! address_lat=35.6895
//! address_lng=139.6917
//! checkin_time=09:00
//! checkout_time=18:30:00
//! checkin_random_range_minutes=20
//! checkout_random_range_minutes=30
//! ; Monday through Friday
//! workday_week=1,2,3,4,5
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveTime;
use thiserror::Error;

use punchbot_types::Location;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing setting: {0}")]
    MissingKey(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Raw settings map, replaced wholesale on every reload.
///
/// Values stay untyped here; typed snapshots are taken at point of use via
/// [`Settings::portal`] and [`Settings::schedule`].
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

/// Everything the portal client needs for one tick.
#[derive(Debug, Clone)]
pub struct PortalSettings {
    /// API base URL, no trailing slash.
    pub base_url: String,
    /// Origin/referer host the portal expects.
    pub origin: String,
    pub user_agent: String,
    pub login_id: String,
    pub password: String,
    /// Office geolocation submitted with punches.
    pub office: Location,
}

/// Everything the scheduler needs for one tick.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub check_in: NaiveTime,
    pub check_out: NaiveTime,
    /// Random window added to the nominal check-in time, in minutes.
    pub check_in_window_min: u32,
    pub check_out_window_min: u32,
    /// Weekday numbers, 0 = Sunday .. 6 = Saturday.
    pub workdays: Vec<u32>,
}

impl Settings {
    /// Read and parse the settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    /// Parse settings from text. Unparseable lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            values.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }
        Self { values }
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingKey(key))
    }

    /// Typed snapshot of the portal-facing settings.
    pub fn portal(&self) -> Result<PortalSettings, ConfigError> {
        Ok(PortalSettings {
            base_url: self.require("url_api")?.to_string(),
            origin: self.require("url_referer")?.to_string(),
            user_agent: self.require("agent")?.to_string(),
            login_id: self.require("id")?.to_string(),
            password: self.require("password")?.to_string(),
            office: Location {
                address: self.require("address")?.to_string(),
                lat: self.require("address_lat")?.to_string(),
                lng: self.require("address_lng")?.to_string(),
            },
        })
    }

    /// Typed snapshot of the scheduling settings.
    pub fn schedule(&self) -> Result<ScheduleSettings, ConfigError> {
        Ok(ScheduleSettings {
            check_in: parse_clock("checkin_time", self.require("checkin_time")?)?,
            check_out: parse_clock("checkout_time", self.require("checkout_time")?)?,
            check_in_window_min: self.minutes("checkin_random_range_minutes")?,
            check_out_window_min: self.minutes("checkout_random_range_minutes")?,
            workdays: self.workdays()?,
        })
    }

    /// Optional minute count; absent means 0.
    fn minutes(&self, key: &'static str) -> Result<u32, ConfigError> {
        match self.get(key) {
            None => Ok(0),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key,
                value: raw.to_string(),
            }),
        }
    }

    /// Comma-separated weekday numbers; absent means no workdays at all.
    fn workdays(&self) -> Result<Vec<u32>, ConfigError> {
        let Some(raw) = self.get("workday_week") else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse().map_err(|_| ConfigError::Invalid {
                    key: "workday_week",
                    value: raw.to_string(),
                })
            })
            .collect()
    }
}

/// Strip one layer of matching single or double quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse a `HH:MM` or `HH:MM:SS` clock string; seconds default to 0.
fn parse_clock(key: &'static str, raw: &str) -> Result<NaiveTime, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key,
        value: raw.to_string(),
    };

    let mut parts = raw.split(':');
    let hour = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let minute = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let second = match parts.next() {
        None => 0,
        Some(p) => p.parse().map_err(|_| invalid())?,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
; portal
url_api=https://hr.example.co.jp/api
url_referer=https://hr.example.co.jp
agent="Mozilla/5.0 (X11; Linux x86_64)"
id=emp-1024
password='s3cret'
# office
address=1-2-3 Chiyoda, Tokyo
address_lat=35.6895
address_lng=139.6917
checkin_time=09:00
checkout_time=18:30:00
checkin_random_range_minutes=20
checkout_random_range_minutes=30
workday_week=1, 2,3,4,5
"#;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let settings = Settings::parse(FULL);
        assert!(settings.get("; portal").is_none());
        assert!(settings.get("# office").is_none());
        assert_eq!(settings.get("id"), Some("emp-1024"));
    }

    #[test]
    fn test_parse_strips_quotes() {
        let settings = Settings::parse(FULL);
        assert_eq!(settings.get("agent"), Some("Mozilla/5.0 (X11; Linux x86_64)"));
        assert_eq!(settings.get("password"), Some("s3cret"));
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let settings = Settings::parse("key=a=b");
        assert_eq!(settings.get("key"), Some("a=b"));
    }

    #[test]
    fn test_unmatched_quote_kept_verbatim() {
        let settings = Settings::parse("key=\"half");
        assert_eq!(settings.get("key"), Some("\"half"));
    }

    #[test]
    fn test_portal_snapshot() {
        let portal = Settings::parse(FULL).portal().unwrap();
        assert_eq!(portal.base_url, "https://hr.example.co.jp/api");
        assert_eq!(portal.origin, "https://hr.example.co.jp");
        assert_eq!(portal.office.lat, "35.6895");
    }

    #[test]
    fn test_portal_missing_key() {
        let err = Settings::parse("url_api=x").portal().unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("url_referer")));
    }

    #[test]
    fn test_schedule_snapshot() {
        let schedule = Settings::parse(FULL).schedule().unwrap();
        assert_eq!(schedule.check_in, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(schedule.check_out, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(schedule.check_in_window_min, 20);
        assert_eq!(schedule.workdays, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_schedule_windows_default_to_zero() {
        let schedule =
            Settings::parse("checkin_time=09:00\ncheckout_time=18:00\nworkday_week=1")
                .schedule()
                .unwrap();
        assert_eq!(schedule.check_in_window_min, 0);
        assert_eq!(schedule.check_out_window_min, 0);
    }

    #[test]
    fn test_schedule_missing_workdays_means_none() {
        let schedule = Settings::parse("checkin_time=09:00\ncheckout_time=18:00")
            .schedule()
            .unwrap();
        assert!(schedule.workdays.is_empty());
    }

    #[test]
    fn test_clock_seconds_optional() {
        assert_eq!(
            parse_clock("checkin_time", "07:45").unwrap(),
            NaiveTime::from_hms_opt(7, 45, 0).unwrap()
        );
        assert_eq!(
            parse_clock("checkin_time", "07:45:30").unwrap(),
            NaiveTime::from_hms_opt(7, 45, 30).unwrap()
        );
    }

    #[test]
    fn test_clock_rejects_garbage() {
        assert!(parse_clock("checkin_time", "9am").is_err());
        assert!(parse_clock("checkin_time", "25:00").is_err());
        assert!(parse_clock("checkin_time", "09:00:00:00").is_err());
    }

    #[test]
    fn test_invalid_minutes() {
        let err = Settings::parse(
            "checkin_time=09:00\ncheckout_time=18:00\ncheckin_random_range_minutes=soon",
        )
        .schedule()
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "checkin_random_range_minutes",
                ..
            }
        ));
    }
}
