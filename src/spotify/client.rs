use std::{sync::Arc, time::Duration};

use reqwest::{Client, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    error::{ClientError, Result},
    management::AuthSession,
    types::ApiErrorResponse,
    warning,
};

pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_LIMIT: u32 = 20;

const MAX_ATTEMPTS: u32 = 3;
const MAX_RETRY_AFTER_SECS: u64 = 120;
const BAD_GATEWAY_DELAY: Duration = Duration::from_secs(10);

/// Typed access to the Spotify Web API on behalf of an [`AuthSession`].
///
/// Every request carries the session's bearer token, refreshed first when it
/// has expired. A 401 or 403 ends the session and yields
/// [`ClientError::Unauthorized`]; any other non-2xx status yields
/// [`ClientError::RemoteRequestFailed`] and leaves the session alone.
#[derive(Clone)]
pub struct SpotifyClient {
    session: Arc<AuthSession>,
    http: Client,
    api_url: String,
    bad_gateway_delay: Duration,
}

impl SpotifyClient {
    pub fn new(session: Arc<AuthSession>) -> Self {
        let api_url = session.config().api_base().to_string();
        Self {
            session,
            http: Client::new(),
            api_url,
            bad_gateway_delay: BAD_GATEWAY_DELAY,
        }
    }

    /// Overrides the wait before retrying a 502 response.
    pub fn with_bad_gateway_delay(mut self, delay: Duration) -> Self {
        self.bad_gateway_delay = delay;
        self
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub(crate) fn check_limit(limit: u32) -> Result<()> {
        if (1..=MAX_LIMIT).contains(&limit) {
            Ok(())
        } else {
            Err(ClientError::InvalidLimit(limit))
        }
    }

    /// Sends an authorized GET to `path` below the API base url.
    ///
    /// Throttling (429 with a reasonable `Retry-After`) and 502 responses are
    /// retried a few times before giving up.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempt = 1;

        loop {
            let token = self.session.valid_access_token().await?;
            let res = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&token)
                .send()
                .await?;

            let status = res.status();
            if status.is_success() {
                return Ok(res.json::<T>().await?);
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                if let Err(e) = self.session.force_logout().await {
                    warning!("Failed to clear stored tokens: {}", e);
                }
                return Err(ClientError::Unauthorized);
            }

            if attempt < MAX_ATTEMPTS {
                if let Some(wait) = self.retry_delay(&res) {
                    sleep(wait).await;
                    attempt += 1;
                    continue;
                }
            }

            return Err(ClientError::RemoteRequestFailed {
                status: status.as_u16(),
                message: error_message(res).await,
            });
        }
    }

    fn retry_delay(&self, res: &Response) -> Option<Duration> {
        match res.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = res
                    .headers()
                    .get(RETRY_AFTER)?
                    .to_str()
                    .ok()?
                    .trim()
                    .parse::<u64>()
                    .ok()?;
                if retry_after <= MAX_RETRY_AFTER_SECS {
                    Some(Duration::from_secs(retry_after))
                } else {
                    warning!(
                        "Spotify asked to retry after {} seconds. Try again later.",
                        retry_after
                    );
                    None
                }
            }
            StatusCode::BAD_GATEWAY => Some(self.bad_gateway_delay),
            _ => None,
        }
    }
}

async fn error_message(res: Response) -> String {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(err) => err.error.message,
        Err(_) if !body.trim().is_empty() => body,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
