//! Typed client for the session API.
//!
//! Requests carry a persistent cookie store, so the encrypted session cookie set by
//! one call is sent back on the next. The high-level methods never fail: transport,
//! status and decoding errors are logged and reported as `None` or `false`.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::handlers::user::UserResponse;
use crate::models::user::UserRecord;

/// Request timeout used by [`SessionClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single API call.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent, timed out, or the body could not be decoded.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct OkResponse {
    #[serde(default)]
    ok: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// A cookie-carrying client for `/api/user`.
#[derive(Clone, Debug)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
}

impl SessionClient {
    /// Creates a client for the API served at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Sends a request and decodes the JSON response.
    pub async fn fetch<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
            return Err(ClientError::Status { status, message });
        }

        Ok(response.json::<T>().await?)
    }

    /// The user in the session cookie, or `None` when anonymous or on any error.
    pub async fn get_current_user(&self) -> Option<UserRecord> {
        match self
            .fetch::<UserResponse, ()>(Method::GET, "/api/user", None)
            .await
        {
            Ok(response) => response.user,
            Err(e) => {
                tracing::warn!("⚠️ get_current_user failed: {}", e);
                None
            }
        }
    }

    /// Asks the server to write an encrypted `null` session cookie.
    pub async fn init_remote(&self) -> bool {
        self.call_ok::<()>(Method::GET, "/api/user/init", None).await
    }

    /// Replaces the session cookie with `payload`.
    pub async fn set_remote(&self, payload: Option<&UserRecord>) -> bool {
        self.call_ok(Method::POST, "/api/user", Some(&payload)).await
    }

    /// Expires the session cookie.
    pub async fn logout_remote(&self) -> bool {
        self.call_ok::<()>(Method::POST, "/api/user/logout", None).await
    }

    async fn call_ok<B>(&self, method: Method, path: &str, body: Option<&B>) -> bool
    where
        B: Serialize + ?Sized,
    {
        match self.fetch::<OkResponse, B>(method, path, body).await {
            Ok(response) => response.ok,
            Err(e) => {
                tracing::warn!("⚠️ {} failed: {}", path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = SessionClient::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn unreachable_server_reads_as_anonymous() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = SessionClient::with_timeout(
            format!("http://127.0.0.1:{}", port),
            Duration::from_millis(500),
        )
        .unwrap();

        assert_eq!(client.get_current_user().await, None);
        assert!(!client.init_remote().await);
        assert!(!client.logout_remote().await);
    }
}
