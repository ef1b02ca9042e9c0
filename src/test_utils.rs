//! Test utilities for FinTrip
//!
//! This module provides common fixtures for unit tests: an in-memory
//! session store with a recording navigator, sample profiles, and error
//! assertion helpers.

use crate::error::FintripError;
use crate::navigation::RecordingNavigator;
use crate::session::{SessionStore, UserProfile};
use crate::storage::MemoryStorage;
use std::sync::Arc;

/// In-memory session store and the collaborators behind it
pub struct MemorySession {
    pub store: Arc<SessionStore>,
    pub storage: Arc<MemoryStorage>,
    pub cookies: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

/// Create a logged-out session store backed by memory storage
///
/// # Arguments
///
/// * `location` - What the navigator reports as the current location
pub fn memory_session(location: Option<&str>) -> MemorySession {
    let storage = Arc::new(MemoryStorage::new());
    let cookies = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(match location {
        Some(location) => RecordingNavigator::at(location),
        None => RecordingNavigator::new(),
    });

    let store = Arc::new(SessionStore::new(
        storage.clone(),
        cookies.clone(),
        navigator.clone(),
    ));

    MemorySession {
        store,
        storage,
        cookies,
        navigator,
    }
}

/// Profile with just an id, email and name
pub fn sample_profile(full_name: &str) -> UserProfile {
    UserProfile {
        id: Some("u-1".to_string()),
        email: Some("a@b.com".to_string()),
        full_name: full_name.to_string(),
        ..UserProfile::default()
    }
}

/// Assert that an error carries a [`FintripError`] matching `pred`
///
/// # Panics
///
/// Panics if the result is Ok, is not a `FintripError`, or fails `pred`
pub fn assert_fintrip_error<T: std::fmt::Debug>(
    result: crate::error::Result<T>,
    pred: impl FnOnce(&FintripError) -> bool,
) {
    match result {
        Ok(v) => panic!("Expected an error but got Ok({:?})", v),
        Err(e) => match e.downcast_ref::<FintripError>() {
            Some(inner) => assert!(pred(inner), "Unexpected error: {}", inner),
            None => panic!("Expected a FintripError but got: {}", e),
        },
    }
}
