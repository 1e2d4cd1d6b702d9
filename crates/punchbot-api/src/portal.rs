//! Portal endpoints and session state.

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use punchbot_config::PortalSettings;
use punchbot_types::{
    AttendanceEnvelope, AttendanceQuery, AttendanceRecord, LoginParams, LoginResponse, Profile,
    PunchKind, PunchParams,
};

use crate::client::{DEFAULT_RETRIES, Identity, RestClient};

/// The attendance portal as the scheduler sees it.
///
/// Use `&self` for all methods — implementations keep session state behind
/// interior mutability.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Authenticate and replace the stored session profile.
    async fn login(&self, settings: &PortalSettings) -> anyhow::Result<Profile>;

    /// Fetch today's attendance record. Single attempt: `Err` means the
    /// query itself failed, which is distinct from a fetched-but-empty
    /// record.
    async fn attendance(&self, settings: &PortalSettings) -> anyhow::Result<AttendanceRecord>;

    /// Submit a check-in or check-out event. Returns the portal's result
    /// object verbatim.
    async fn punch(&self, settings: &PortalSettings, kind: PunchKind) -> anyhow::Result<Value>;
}

/// reqwest-backed portal client holding the per-process session.
pub struct PortalClient {
    http: RestClient,
    session: RwLock<Option<Profile>>,
}

impl PortalClient {
    pub fn new() -> Self {
        Self {
            http: RestClient::new(),
            session: RwLock::new(None),
        }
    }

    /// Build a client around a pre-configured [`RestClient`]. Tests use
    /// this to shrink retry delays.
    pub fn with_client(http: RestClient) -> Self {
        Self {
            http,
            session: RwLock::new(None),
        }
    }

    /// Currently stored profile, if any login succeeded.
    pub async fn profile(&self) -> Option<Profile> {
        self.session.read().await.clone()
    }

    async fn token(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map(|p| p.token.clone())
            .unwrap_or_default()
    }

    fn identity(settings: &PortalSettings) -> Identity {
        Identity {
            origin: settings.origin.clone(),
            user_agent: settings.user_agent.clone(),
        }
    }
}

impl Default for PortalClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Portal for PortalClient {
    async fn login(&self, settings: &PortalSettings) -> anyhow::Result<Profile> {
        let url = format!("{}/manager/login", settings.base_url);
        let params = LoginParams {
            id: settings.login_id.clone(),
            password: settings.password.clone(),
            display_loading: true,
        };

        let response: LoginResponse = self
            .http
            .request(
                Method::POST,
                &url,
                &params,
                &Self::identity(settings),
                None,
                DEFAULT_RETRIES,
            )
            .await
            .context("login request failed")?;

        let Some(profile) = response.myinfo else {
            bail!("login response carried no profile");
        };

        info!(last_name = %profile.last_name, "Login successful");
        *self.session.write().await = Some(profile.clone());
        Ok(profile)
    }

    async fn attendance(&self, settings: &PortalSettings) -> anyhow::Result<AttendanceRecord> {
        let url = format!("{}/dashboard/attendance/state/load", settings.base_url);
        let token = self.token().await;

        let envelope: AttendanceEnvelope = self
            .http
            .request(
                Method::GET,
                &url,
                &AttendanceQuery {
                    display_loading: true,
                },
                &Self::identity(settings),
                Some(&token),
                1,
            )
            .await
            .context("attendance query failed")?;

        Ok(envelope.sendpacket.unwrap_or_default())
    }

    async fn punch(&self, settings: &PortalSettings, kind: PunchKind) -> anyhow::Result<Value> {
        let url = format!("{}/dashboard/attendance/item/add", settings.base_url);
        let token = self.token().await;
        let params = PunchParams {
            kind,
            location: settings.office.clone(),
            display_loading: true,
        };

        self.http
            .request(
                Method::POST,
                &url,
                &params,
                &Self::identity(settings),
                Some(&token),
                DEFAULT_RETRIES,
            )
            .await
            .context("punch request failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::Router;
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use punchbot_types::Location;
    use serde_json::json;

    fn settings(addr: SocketAddr) -> PortalSettings {
        PortalSettings {
            base_url: format!("http://{addr}"),
            origin: "https://hr.example.co.jp".into(),
            user_agent: "test-agent/1.0".into(),
            login_id: "emp-1024".into(),
            password: "s3cret".into(),
            office: Location {
                address: "1-2-3 Chiyoda".into(),
                lat: "35.6895".into(),
                lng: "139.6917".into(),
            },
        }
    }

    fn client() -> PortalClient {
        PortalClient::with_client(RestClient::new().with_retry_base(Duration::from_millis(10)))
    }

    /// Fake portal: login hands out a token, the other endpoints echo
    /// whether that token came back.
    fn fake_portal() -> Router {
        Router::new()
            .route(
                "/manager/login",
                post(|body: axum::Json<Value>| async move {
                    if body["password"] == "s3cret" {
                        axum::Json(json!({
                            "myinfo": {"token": "tok-777", "last_name": "Tanaka"}
                        }))
                    } else {
                        axum::Json(json!({"error": "bad credentials"}))
                    }
                }),
            )
            .route(
                "/dashboard/attendance/state/load",
                get(|headers: HeaderMap| async move {
                    if headers.get("x-access-token").is_some() {
                        axum::Json(json!({"sendpacket": {"starttime": "09:02:11"}}))
                    } else {
                        axum::Json(json!({}))
                    }
                }),
            )
            .route(
                "/dashboard/attendance/item/add",
                post(|headers: HeaderMap, body: axum::Json<Value>| async move {
                    axum::Json(json!({
                        "accepted": body["type"],
                        "authed": headers.get("x-access-token").is_some(),
                    }))
                }),
            )
    }

    async fn spawn(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_login_stores_profile() {
        let addr = spawn(fake_portal()).await;
        let portal = client();
        let settings = settings(addr);

        assert!(portal.profile().await.is_none());
        let profile = portal.login(&settings).await.unwrap();
        assert_eq!(profile.token, "tok-777");
        assert_eq!(portal.profile().await.unwrap().last_name, "Tanaka");
    }

    #[tokio::test]
    async fn test_login_rejects_profileless_response() {
        let addr = spawn(fake_portal()).await;
        let portal = client();
        let mut settings = settings(addr);
        settings.password = "wrong".into();

        assert!(portal.login(&settings).await.is_err());
        assert!(portal.profile().await.is_none());
    }

    #[tokio::test]
    async fn test_attendance_uses_session_token() {
        let addr = spawn(fake_portal()).await;
        let portal = client();
        let settings = settings(addr);

        // Without a session the fake portal returns no sendpacket at all,
        // which must read back as the empty record.
        let record = portal.attendance(&settings).await.unwrap();
        assert!(!record.has(PunchKind::In));

        portal.login(&settings).await.unwrap();
        let record = portal.attendance(&settings).await.unwrap();
        assert_eq!(record.starttime.as_deref(), Some("09:02:11"));
    }

    #[tokio::test]
    async fn test_punch_sends_kind_and_token() {
        let addr = spawn(fake_portal()).await;
        let portal = client();
        let settings = settings(addr);

        portal.login(&settings).await.unwrap();
        let result = portal.punch(&settings, PunchKind::Out).await.unwrap();
        assert_eq!(result["accepted"], "end");
        assert_eq!(result["authed"], true);
    }

    #[tokio::test]
    async fn test_attendance_error_is_distinct_from_empty() {
        // No server behind this address: the query must fail, not read as
        // an empty record.
        let portal = client();
        let settings = settings("127.0.0.1:9".parse().unwrap());
        assert!(portal.attendance(&settings).await.is_err());
    }
}
