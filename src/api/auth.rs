//! Login and logout against the FinTrip auth API

use crate::api::types::{ApiEnvelope, LoginRequest, LoginResult};
use crate::error::{FintripError, Result};
use crate::http::ApiClient;
use crate::session::UserProfile;
use std::sync::Arc;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub profile: UserProfile,
    /// Where the user was when their previous session expired, if anywhere.
    pub return_to: Option<String>,
}

/// Auth endpoints
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// On `code == 200` the token and profile are handed to the session
    /// store. Input is validated locally first; nothing is sent for an
    /// empty field.
    ///
    /// # Errors
    ///
    /// - [`FintripError::Validation`] for empty or malformed input.
    /// - [`FintripError::Authentication`] when the backend answers with a
    ///   non-success `code` or no `result`.
    /// - Any [`ApiClient::request`] error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = email.trim();
        validate_credentials(email, password)?;

        let envelope: ApiEnvelope<LoginResult> = self
            .client
            .post_json("/auth/login", &LoginRequest { email, password })
            .await?;

        if !envelope.is_success() {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("login failed with code {}", envelope.code));
            return Err(FintripError::Authentication(message).into());
        }

        let result = envelope.result.ok_or_else(|| {
            FintripError::Authentication("login response did not include a session".into())
        })?;

        let session = self.client.session();
        session.login(result.token, result.user.clone());

        Ok(LoginOutcome {
            profile: result.user,
            return_to: session.take_return_location(),
        })
    }

    /// Sign out locally and go back to the login entry point.
    pub fn logout(&self) {
        self.client.session().logout();
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() {
        return Err(FintripError::Validation("Email is required".into()).into());
    }
    if !email.contains('@') {
        return Err(FintripError::Validation("Email address is not valid".into()).into());
    }
    if password.is_empty() {
        return Err(FintripError::Validation("Password is required".into()).into());
    }
    Ok(())
}
