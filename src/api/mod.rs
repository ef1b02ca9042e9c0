//! Backend endpoints used by the client
//!
//! - `auth`: `POST /auth/login`
//! - `chat`: `POST /chatbot/chat/`

pub mod auth;
pub mod chat;
pub mod types;

pub use auth::{AuthApi, LoginOutcome};
pub use chat::ChatApi;
pub use types::{ApiEnvelope, ChatReply, ChatRequest, LoginRequest, LoginResult};
