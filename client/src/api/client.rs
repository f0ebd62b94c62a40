//! Authenticated HTTP client with a single refresh-and-retry cycle.
//!
//! Every authenticated call goes through [`ApiClient::send`]: the current
//! access token is attached as a bearer header, and a 401 response
//! triggers at most one refresh of the access token followed by one
//! replay of the original request. When the refresh path itself fails the
//! session is beyond recovery: both tokens are cleared and
//! [`SessionEvent::SessionExpired`] is broadcast so the application can
//! reset from a clean slate.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use dormlink_common::{
    LoginRequest, MarkReadRequest, Notification, RefreshRequest, RefreshResponse, RegisterRequest,
    TokenPair, UserProfile,
};

use crate::auth::credentials::CredentialStore;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::SessionEvent;

/// Chokepoint for every authenticated network call.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, credentials: Arc<CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Receiver for session-level events. The application layer reacts to
    /// [`SessionEvent::SessionExpired`] by resetting its state.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // Credential endpoints (unauthenticated, no interceptor involvement)
    // ========================================================================

    /// `POST /token/` - exchange username/password for a token pair.
    pub async fn obtain_token(&self, username: &str, password: &str) -> Result<TokenPair> {
        let url = format!("{}/token/", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        self.expect_json(response, "/token/").await
    }

    /// `POST /register/` - create an account; the server logs the new user
    /// straight in by returning a token pair.
    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenPair> {
        let url = format!("{}/register/", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;
        self.expect_json(response, "/register/").await
    }

    /// `GET /profile/` with an explicit token, bypassing the interceptor so
    /// the session manager can hydrate before the session is established.
    pub async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        let url = format!("{}/profile/", self.base_url);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        self.expect_json(response, "/profile/").await
    }

    // ========================================================================
    // Authenticated endpoints
    // ========================================================================

    /// `GET /notifications/my/`.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.get_json("/notifications/my/").await
    }

    /// `POST /notifications/mark-read/`.
    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<()> {
        let body = serde_json::to_value(MarkReadRequest { notification_id })?;
        let response = self
            .send(Method::POST, "/notifications/mark-read/", Some(body))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status,
                path: "/notifications/mark-read/".to_string(),
            });
        }
        Ok(())
    }

    /// Authenticated GET for domain endpoints (listings, applications, ...)
    /// whose shapes this crate does not know.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None).await?;
        self.expect_json(response, path).await
    }

    /// Authenticated POST counterpart of [`ApiClient::get_json`].
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::POST, path, Some(body)).await?;
        self.expect_json(response, path).await
    }

    // ========================================================================
    // Interceptor
    // ========================================================================

    /// Send a request with the current access token attached, refreshing
    /// and replaying once on 401.
    ///
    /// The retry guard is scoped to this call: a replay that 401s again is
    /// not retried, and concurrent calls each run their own refresh (there
    /// is no coalescing of simultaneous refresh attempts).
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut token = self.credentials.access();
        let mut refreshed = false;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(ref token) = token {
                request = request.bearer_auth(token);
            }
            if let Some(ref body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }
            if refreshed {
                // A fresh access token was rejected too; the refresh token
                // no longer grants access.
                tracing::error!(path, "Replay after refresh was rejected");
                return self.expire_session();
            }

            refreshed = true;
            token = Some(self.refresh_access().await?);
            tracing::debug!(path, "Replaying request with refreshed token");
        }
    }

    /// `POST /token/refresh/` - mint a new access token. Any failure here
    /// is irrecoverable and expires the session.
    async fn refresh_access(&self) -> Result<String> {
        let Some(refresh) = self.credentials.refresh() else {
            tracing::warn!("Received 401 with no refresh token available");
            return self.expire_session();
        };

        let url = format!("{}/token/refresh/", self.base_url);
        let response = match self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Token refresh request failed: {}", e);
                return self.expire_session();
            }
        };

        if !response.status().is_success() {
            tracing::error!(status = response.status().as_u16(), "Token refresh rejected");
            return self.expire_session();
        }

        let body: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Token refresh returned an invalid body: {}", e);
                return self.expire_session();
            }
        };

        self.credentials.set_access(&body.access);
        tracing::debug!("Access token refreshed");
        Ok(body.access)
    }

    fn expire_session<T>(&self) -> Result<T> {
        self.credentials.clear_tokens();
        let _ = self.events.send(SessionEvent::SessionExpired);
        Err(Error::SessionExpired)
    }

    async fn expect_json<T: DeserializeOwned>(&self, response: Response, path: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status,
                path: path.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}
