//! Low-level REST client: fixed identity headers, bounded linear-backoff
//! retry, JSON in and out.

use std::time::Duration;

use anyhow::Context;
use reqwest::header;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Default number of attempts for state-changing calls.
pub const DEFAULT_RETRIES: u32 = 3;

/// Identity headers the portal expects on every request.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Origin host; also sent as `referer` (with a trailing slash) and
    /// `x-client-host`.
    pub origin: String,
    pub user_agent: String,
}

/// JSON HTTP client with bounded retry.
///
/// Non-GET requests carry `params` as a JSON body; GET requests carry them
/// as the query string. A session token is attached as `x-access-token`
/// only when it is non-trivial.
pub struct RestClient {
    client: Client,
    retry_base: Duration,
}

impl RestClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            retry_base: Duration::from_secs(2),
        }
    }

    /// Override the backoff base delay. Tests shrink it to milliseconds.
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    /// Issue a request, retrying up to `retries` attempts total with
    /// linear backoff between them. The last error surfaces to the caller.
    pub async fn request<P, R>(
        &self,
        method: Method,
        url: &str,
        params: &P,
        identity: &Identity,
        token: Option<&str>,
        retries: u32,
    ) -> anyhow::Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send(method.clone(), url, params, identity, token).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    warn!(url, attempt, retries, "Request failed: {e}");
                    if attempt >= retries {
                        return Err(e);
                    }
                    tokio::time::sleep(retry_delay(self.retry_base, attempt)).await;
                }
            }
        }
    }

    async fn send<P, R>(
        &self,
        method: Method,
        url: &str,
        params: &P,
        identity: &Identity,
        token: Option<&str>,
    ) -> anyhow::Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(header::REFERER, format!("{}/", identity.origin))
            .header(header::ORIGIN, identity.origin.as_str())
            .header("x-client-host", identity.origin.as_str())
            .header(header::USER_AGENT, identity.user_agent.as_str());

        // The portal hands out placeholder tokens of one or two characters
        // for anonymous sessions; those must not be echoed back.
        if let Some(token) = token.filter(|t| t.len() > 2) {
            request = request.header("x-access-token", token);
        }

        request = if method == Method::GET {
            request.query(params)
        } else {
            request.json(params)
        };

        request
            .send()
            .await
            .context("transport error")?
            .error_for_status()
            .context("portal returned an error status")?
            .json()
            .await
            .context("response parse failed")
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear backoff: `base × attempt` — 2 s, 4 s, … with the default base.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}
