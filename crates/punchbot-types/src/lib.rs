use serde::{Deserialize, Serialize};

// ──────────────────── Session Types ────────────────────

/// User profile returned by the portal on login (the `myinfo` object).
///
/// The portal omits fields freely depending on account type, so every
/// field defaults to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Session token, attached to authenticated requests.
    #[serde(default)]
    pub token: String,
    /// Internal user id.
    #[serde(default)]
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub last_name: String,
    /// Office location code.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub department: String,
}

/// Response envelope of the login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    /// Present on a successful login; any other shape is a failure.
    #[serde(default)]
    pub myinfo: Option<Profile>,
}

// ──────────────────── Attendance Types ────────────────────

/// Server-side truth about today's punches (the `sendpacket` object).
///
/// A field counts as recorded iff it is present and non-empty — a punch
/// made through another device shows up here even when the local state
/// knows nothing about it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default)]
    pub starttime: Option<String>,
    #[serde(default)]
    pub endtime: Option<String>,
}

impl AttendanceRecord {
    /// Whether the punch of the given kind is already recorded upstream.
    pub fn has(&self, kind: PunchKind) -> bool {
        let value = match kind {
            PunchKind::In => &self.starttime,
            PunchKind::Out => &self.endtime,
        };
        value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Response envelope of the attendance-state endpoint.
#[derive(Debug, Deserialize)]
pub struct AttendanceEnvelope {
    /// Missing entirely when the day has no record yet.
    #[serde(default)]
    pub sendpacket: Option<AttendanceRecord>,
}

// ──────────────────── Punch Types ────────────────────

/// Which attendance event to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PunchKind {
    #[serde(rename = "start")]
    In,
    #[serde(rename = "end")]
    Out,
}

impl PunchKind {
    /// Wire name of this event ("start" / "end").
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "start",
            Self::Out => "end",
        }
    }
}

/// Office geolocation sent with a punch. Coordinates travel as strings,
/// exactly as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub lat: String,
    pub lng: String,
}

/// Parameters for the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginParams {
    pub id: String,
    pub password: String,
    #[serde(rename = "displayLoading")]
    pub display_loading: bool,
}

/// Query parameters for the attendance-state endpoint.
#[derive(Debug, Serialize)]
pub struct AttendanceQuery {
    #[serde(rename = "displayLoading")]
    pub display_loading: bool,
}

/// Parameters for the punch endpoint.
#[derive(Debug, Serialize)]
pub struct PunchParams {
    #[serde(rename = "type")]
    pub kind: PunchKind,
    pub location: Location,
    #[serde(rename = "displayLoading")]
    pub display_loading: bool,
}
