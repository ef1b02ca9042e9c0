//! HTTP client for the FinTrip backend
//!
//! Every request goes to `<base_url>/<path>` with a fixed timeout and, when
//! signed in, an `Authorization: Bearer <token>` header plus the mirrored
//! token cookie.
//!
//! # Session expiry
//!
//! A `401 Unauthorized` from any path is handled here, before the caller
//! sees it: the current location is recorded for a later return, the
//! session is cleared, the user gets a blocking notice and is redirected to
//! login. The caller then receives [`FintripError::Unauthorized`]. Every
//! other non-success status is returned untouched as [`FintripError::Api`].
//!
//! No request is retried.

use crate::error::{FintripError, Result};
use crate::session::SessionStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Timeout applied to every backend request unless overridden.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Message shown when the backend rejects the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Per-request extras
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Backend client bound to one [`SessionStore`]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Construct a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FintripError::Config`] if the URL does not parse or the
    /// underlying client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionStore>) -> Result<Self> {
        url::Url::parse(base_url)
            .map_err(|e| FintripError::Config(format!("Invalid API base URL {}: {}", base_url, e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FintripError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Absolute URL for a backend path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(token) = self.session.token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FintripError::Validation(format!("Invalid token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(cookie) = self.session.cookie_header() {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.insert(COOKIE, value);
            }
        }

        Ok(headers)
    }

    /// Send a request and return the successful response.
    ///
    /// # Errors
    ///
    /// - [`FintripError::Unauthorized`] after the session-expiry handling
    ///   described in the module docs.
    /// - [`FintripError::Api`] for any other non-success status.
    /// - [`FintripError::Transport`] for connection failures and timeouts.
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path);
        tracing::debug!("{} {}", method, url);

        let mut req = self
            .http_client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?);

        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FintripError::Validation(format!("Invalid header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FintripError::Validation(format!("Invalid header value: {}", e)))?;
            req = req.header(name, value);
        }
        if let Some(timeout) = options.timeout {
            req = req.timeout(timeout);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            FintripError::Transport(format!("{} {} failed: {}", method, path, reason))
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(path);
            return Err(FintripError::Unauthorized(format!("{} {} returned 401", method, path)).into());
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            tracing::debug!("{} {} returned {}", method, path, status);
            return Err(FintripError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response)
    }

    /// `GET` a path and decode the JSON body.
    pub async fn get_json<T>(&self, path: &str, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request::<()>(Method::GET, path, None, options)
            .await?;
        decode(response).await
    }

    /// `POST` a JSON body to a path and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, path, Some(body), RequestOptions::default())
            .await?;
        decode(response).await
    }

    fn handle_unauthorized(&self, path: &str) {
        tracing::warn!("session rejected by backend on {}", path);

        let navigator = self.session.navigator();
        if let Some(location) = navigator.current_location() {
            self.session.remember_return_location(&location);
        }
        self.session.clear();
        navigator.notify_blocking(SESSION_EXPIRED_MESSAGE);
        navigator.redirect_to_login();
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FintripError::Transport(format!("Failed to read response body: {}", e)))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_fintrip_error, memory_session, sample_profile};

    fn client(base: &str) -> ApiClient {
        let session = memory_session(None).store;
        ApiClient::new(base, Duration::from_secs(DEFAULT_TIMEOUT_SECS), session).unwrap()
    }

    #[test]
    fn test_url_for_joins_slashes() {
        let c = client("http://localhost:8000/api/");
        assert_eq!(c.url_for("/auth/login"), "http://localhost:8000/api/auth/login");
        assert_eq!(c.url_for("chatbot/chat/"), "http://localhost:8000/api/chatbot/chat/");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let session = memory_session(None).store;
        let result = ApiClient::new("not a url", Duration::from_secs(1), session).map(|_| ());
        assert_fintrip_error(result, |e| matches!(e, FintripError::Config(_)));
    }

    #[test]
    fn test_auth_headers_follow_session() {
        let c = client("http://localhost:8000/api");
        assert!(c.auth_headers().unwrap().get(AUTHORIZATION).is_none());

        c.session().login("T1", sample_profile("Alice"));
        let headers = c.auth_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer T1");
        assert_eq!(headers.get(COOKIE).unwrap(), "token=T1");
    }

    #[test]
    fn test_unauthorized_handling_order_of_effects() {
        let fx = memory_session(Some("fintrip weather \"Hanoi\""));
        fx.store.login("T1", sample_profile("Alice"));
        let c = ApiClient::new(
            "http://localhost:8000/api",
            Duration::from_secs(1),
            fx.store.clone(),
        )
        .unwrap();

        c.handle_unauthorized("/trips");

        assert!(!fx.store.is_authenticated());
        assert_eq!(fx.navigator.notifications(), vec![SESSION_EXPIRED_MESSAGE.to_string()]);
        assert_eq!(fx.navigator.redirects(), 1);
        assert_eq!(
            fx.store.take_return_location().as_deref(),
            Some("fintrip weather \"Hanoi\"")
        );
    }

    #[test]
    fn test_request_options_builder() {
        let opts = RequestOptions::default()
            .query("q", "Hanoi")
            .header("X-Trace", "1")
            .timeout(Duration::from_secs(2));
        assert_eq!(opts.query, vec![("q".to_string(), "Hanoi".to_string())]);
        assert_eq!(opts.headers.len(), 1);
        assert_eq!(opts.timeout, Some(Duration::from_secs(2)));
    }
}
