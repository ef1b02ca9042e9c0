//! FinTrip - travel planning client library
//!
//! This library provides the client-side core of the FinTrip travel planner:
//! a persisted session store, an expiring cache, an authenticated HTTP client
//! for the FinTrip backend, and cached weather lookups.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: Durable client key/value storage (file-backed or in-memory)
//! - `cache`: Timed cache with a per-instance TTL
//! - `session`: Session store with change subscriptions
//! - `navigation`: Navigator collaborator (notifications, redirect to login)
//! - `http`: Backend HTTP client with bearer auth and session-expiry handling
//! - `api`: Auth and chat endpoints
//! - `weather`: Geocoding and forecast lookups
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fintrip::api::AuthApi;
//! use fintrip::http::ApiClient;
//! use fintrip::navigation::RecordingNavigator;
//! use fintrip::session::SessionStore;
//! use fintrip::storage::MemoryStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Arc::new(SessionStore::new(
//!         Arc::new(MemoryStorage::new()),
//!         Arc::new(MemoryStorage::new()),
//!         Arc::new(RecordingNavigator::new()),
//!     ));
//!     session.restore();
//!
//!     let client = Arc::new(ApiClient::new(
//!         "http://localhost:8000/api",
//!         Duration::from_secs(10),
//!         session.clone(),
//!     )?);
//!     AuthApi::new(client).login("a@b.com", "secret").await?;
//!     assert!(session.is_authenticated());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod weather;

// Re-export commonly used types
pub use cache::TimedCache;
pub use config::Config;
pub use error::{FintripError, Result};
pub use http::ApiClient;
pub use session::{SessionSnapshot, SessionStore, UserProfile};

#[cfg(test)]
pub mod test_utils;
