use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known storage keys
pub mod keys {
    /// Bearer token
    pub const TOKEN: &str = "token";
    /// Serialized user profile
    pub const USER: &str = "user";
    /// Location to return to after a forced re-login
    pub const REDIRECT_AFTER_LOGIN: &str = "redirectAfterLogin";
    /// Prefix for geocoding cache entries
    pub const GEO_CACHE_PREFIX: &str = "geo_";
    /// Prefix for weather cache entries
    pub const WEATHER_CACHE_PREFIX: &str = "weather_";
}

/// A cookie mirrored into the cookie store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    /// Cookie value
    pub value: String,
    /// Cookie path attribute
    pub path: String,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl CookieRecord {
    /// Returns `true` once `now` has reached the expiry time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
