//! Wire types for the FinTrip backend

use crate::session::UserProfile;
use serde::{Deserialize, Serialize};

/// Status code the backend puts in `code` on success
pub const SUCCESS_CODE: i64 = 200;

/// Envelope wrapping most backend responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `result` of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResult {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
}
