//! Session-related types for admin authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thala_core::{Email, Identity};

/// Session-stored admin identity.
///
/// Only the identity is stored; role and permissions are looked up in the
/// admin directory on every request so a directory change takes effect
/// without signing out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's email address.
    pub email: Email,
    /// Display name forwarded by the identity provider.
    pub name: Option<String>,
    /// When the session was established.
    pub signed_in_at: DateTime<Utc>,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(email: Email, name: Option<String>) -> Self {
        Self {
            email,
            name,
            signed_in_at: Utc::now(),
        }
    }

    /// The identity handed to guard chains.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.email.clone(), self.name.clone())
    }
}

impl From<CurrentAdmin> for Identity {
    fn from(admin: CurrentAdmin) -> Self {
        Self::new(admin.email, admin.name)
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current signed-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_admin_roundtrips_through_session_json() {
        let admin = CurrentAdmin::new(
            Email::parse("ops@thala.app").unwrap(),
            Some("Ops".to_string()),
        );
        let value = serde_json::to_value(&admin).unwrap();
        assert_eq!(value["email"], "ops@thala.app");
        let back: CurrentAdmin = serde_json::from_value(value).unwrap();
        assert_eq!(back, admin);
        assert_eq!(Identity::from(back).email.as_str(), "ops@thala.app");
    }
}
