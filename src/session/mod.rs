//! Session store
//!
//! Single source of truth for "is a user signed in, and who are they". The
//! bearer token and the user profile are persisted together in client
//! storage, the token is mirrored into the cookie store for server-side
//! consumers, and every change is published on a `tokio::sync::watch`
//! channel so consumers react without polling.
//!
//! One [`SessionStore`] exists per process. It is shared as
//! `Arc<SessionStore>` and only mutated through its methods.

use crate::error::{FintripError, Result};
use crate::navigation::Navigator;
use crate::storage::{keys, ClientStorage, CookieRecord};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::watch;

pub mod types;
pub use types::{GroupMembership, SessionSnapshot, UserProfile};

/// Default lifetime of the mirrored token cookie.
pub const DEFAULT_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Holds the current session and publishes its changes
pub struct SessionStore {
    storage: Arc<dyn ClientStorage>,
    cookies: Arc<dyn ClientStorage>,
    navigator: Arc<dyn Navigator>,
    cookie_max_age: Duration,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Create a logged-out store. Call [`SessionStore::restore`] once at
    /// startup to pick up a persisted session.
    pub fn new(
        storage: Arc<dyn ClientStorage>,
        cookies: Arc<dyn ClientStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::logged_out());
        Self {
            storage,
            cookies,
            navigator,
            cookie_max_age: Duration::days(DEFAULT_COOKIE_MAX_AGE_DAYS),
            state,
        }
    }

    pub fn with_cookie_max_age(mut self, max_age: Duration) -> Self {
        self.cookie_max_age = max_age;
        self
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Persist and publish a freshly authenticated session.
    ///
    /// Storage failures are logged; the in-memory session is still updated
    /// so the current process keeps working.
    pub fn login(&self, token: impl Into<String>, profile: UserProfile) {
        let token = token.into();

        if let Err(e) = self.persist(&token, &profile) {
            tracing::error!("failed to persist session: {}", e);
        }
        if let Err(e) = self.mirror_cookie(&token) {
            tracing::error!("failed to mirror session cookie: {}", e);
        }

        tracing::info!("signed in as {}", profile.display_name());
        self.state
            .send_replace(SessionSnapshot::authenticated(token, profile));
    }

    /// Forget the session and send the user to the login entry point.
    ///
    /// Subscribers are always notified, even when nobody was signed in.
    pub fn logout(&self) {
        self.remove_persisted();
        self.state.send_replace(SessionSnapshot::logged_out());
        tracing::info!("signed out");
        self.navigator.redirect_to_login();
    }

    /// Forget the session without navigating.
    ///
    /// Safe to call any number of times; subscribers are only notified when
    /// a session was actually present.
    pub(crate) fn clear(&self) {
        self.remove_persisted();

        self.state.send_if_modified(|snapshot| {
            if snapshot.is_authenticated || snapshot.token.is_some() {
                *snapshot = SessionSnapshot::logged_out();
                true
            } else {
                false
            }
        });
    }

    /// Load the persisted session, if any.
    ///
    /// Never fails: a missing, partial or unparsable session resets the
    /// store to logged out and wipes the leftovers.
    pub fn restore(&self) {
        match self.read_persisted() {
            Ok(Some((token, profile))) => {
                if self.cookie_header().is_none() {
                    if let Err(e) = self.mirror_cookie(&token) {
                        tracing::warn!("failed to re-mirror session cookie: {}", e);
                    }
                }
                tracing::debug!("restored session for {}", profile.display_name());
                self.state
                    .send_replace(SessionSnapshot::authenticated(token, profile));
            }
            Ok(None) => {
                self.state.send_replace(SessionSnapshot::logged_out());
            }
            Err(e) => {
                tracing::warn!("discarding persisted session: {}", e);
                self.remove_persisted();
                self.state.send_replace(SessionSnapshot::logged_out());
            }
        }
    }

    /// Snapshot of the current session.
    pub fn current_session(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Current bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.state.subscribe(),
        }
    }

    /// `Cookie` header value for the mirrored token while it is unexpired.
    pub fn cookie_header(&self) -> Option<String> {
        let raw = self.cookies.get_item(keys::TOKEN).ok()??;
        let cookie: CookieRecord = serde_json::from_str(&raw).ok()?;

        if cookie.is_expired_at(Utc::now()) {
            None
        } else {
            Some(format!("{}={}", keys::TOKEN, cookie.value))
        }
    }

    /// Remember where the user was so a later login can send them back.
    pub fn remember_return_location(&self, location: &str) {
        if let Err(e) = self
            .storage
            .set_item(keys::REDIRECT_AFTER_LOGIN, location)
        {
            tracing::warn!("failed to record return location: {}", e);
        }
    }

    /// Read and forget the location recorded by a forced logout.
    pub fn take_return_location(&self) -> Option<String> {
        let location = self
            .storage
            .get_item(keys::REDIRECT_AFTER_LOGIN)
            .ok()
            .flatten()?;
        if let Err(e) = self.storage.remove_item(keys::REDIRECT_AFTER_LOGIN) {
            tracing::warn!("failed to clear return location: {}", e);
        }
        Some(location)
    }

    fn persist(&self, token: &str, profile: &UserProfile) -> Result<()> {
        let profile_json = serde_json::to_string(profile)?;
        self.storage.set_item(keys::TOKEN, token)?;
        self.storage.set_item(keys::USER, &profile_json)
    }

    fn mirror_cookie(&self, token: &str) -> Result<()> {
        let expires_at = Utc::now()
            .checked_add_signed(self.cookie_max_age)
            .ok_or_else(|| FintripError::Storage("cookie expiry is out of range".into()))?;
        let cookie = CookieRecord {
            value: token.to_string(),
            path: "/".to_string(),
            expires_at,
        };
        self.cookies
            .set_item(keys::TOKEN, &serde_json::to_string(&cookie)?)
    }

    fn read_persisted(&self) -> Result<Option<(String, UserProfile)>> {
        let token = self.storage.get_item(keys::TOKEN)?;
        let user = self.storage.get_item(keys::USER)?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => {
                if token.trim().is_empty() {
                    return Err(FintripError::Storage("persisted token is empty".into()).into());
                }
                let profile: UserProfile = serde_json::from_str(&user)?;
                Ok(Some((token, profile)))
            }
            (Some(_), None) => {
                Err(FintripError::Storage("persisted token without a profile".into()).into())
            }
            (None, Some(_)) => {
                Err(FintripError::Storage("persisted profile without a token".into()).into())
            }
        }
    }

    fn remove_persisted(&self) {
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove_item(key) {
                tracing::error!("failed to remove persisted {}: {}", key, e);
            }
        }
        if let Err(e) = self.cookies.remove_item(keys::TOKEN) {
            tracing::error!("failed to remove session cookie: {}", e);
        }
    }
}

/// Handle on the stream of session changes
///
/// Dropping the handle, or calling [`SessionSubscription::unsubscribe`],
/// detaches it.
pub struct SessionSubscription {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionSubscription {
    /// Latest published snapshot.
    pub fn current(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    /// Whether a change arrived since the last [`SessionSubscription::changed`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next change and return the new snapshot.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}
