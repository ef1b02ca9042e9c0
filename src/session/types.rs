use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the signed-in user as returned by `POST /auth/login`
///
/// Display data only. Every field but `full_name` may be absent in the
/// backend payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub group_memberships: Vec<GroupMembership>,
}

impl UserProfile {
    /// Name to greet the user with: full name, else email, else "traveller".
    pub fn display_name(&self) -> &str {
        if !self.full_name.trim().is_empty() {
            &self.full_name
        } else {
            self.email.as_deref().unwrap_or("traveller")
        }
    }
}

/// Membership of the user in a travel group
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Read-only view of the session at one point in time
///
/// `token` and `profile` are always both `Some` or both `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, profile: UserProfile) -> Self {
        Self {
            is_authenticated: true,
            token: Some(token),
            profile: Some(profile),
        }
    }
}
