//! Static admin directory and permission checks.
//!
//! The directory is the single source of truth for who may use the admin
//! panel. It is loaded once at start-up and never mutated; every check is a
//! pure function of `(email, permission)`.
//!
//! Unknown emails are never an error: they simply hold no permissions.

use serde::{Deserialize, Serialize};

use crate::types::{AdminPermission, AdminRole, Email};

/// Errors raised while building an [`AdminDirectory`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The same email appears twice.
    #[error("duplicate admin email: {0}")]
    DuplicateAdmin(String),
}

/// One configured admin, as written in the directory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEntry {
    /// Admin's email address (unique identity).
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role.
    pub role: AdminRole,
}

/// An admin user with the permission set derived from its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// Permissions granted by `role`.
    pub permissions: Vec<AdminPermission>,
}

impl AdminUser {
    /// Build an admin user, deriving permissions from the role.
    #[must_use]
    pub fn new(email: Email, name: impl Into<String>, role: AdminRole) -> Self {
        Self {
            email,
            name: name.into(),
            role,
            permissions: role.permissions().to_vec(),
        }
    }

    /// Returns `true` if this admin holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: AdminPermission) -> bool {
        self.permissions.contains(&permission)
    }
}

impl From<AdminEntry> for AdminUser {
    fn from(entry: AdminEntry) -> Self {
        Self::new(entry.email, entry.name, entry.role)
    }
}

/// The configured set of admins.
#[derive(Debug, Clone, Default)]
pub struct AdminDirectory {
    admins: Vec<AdminUser>,
}

impl AdminDirectory {
    /// Build a directory from configured entries.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::DuplicateAdmin` if an email is listed twice.
    pub fn new(entries: impl IntoIterator<Item = AdminEntry>) -> Result<Self, DirectoryError> {
        let mut admins: Vec<AdminUser> = Vec::new();
        for entry in entries {
            if admins.iter().any(|a| a.email == entry.email) {
                return Err(DirectoryError::DuplicateAdmin(entry.email.into_inner()));
            }
            admins.push(entry.into());
        }
        Ok(Self { admins })
    }

    /// All configured admins, in configuration order.
    #[must_use]
    pub fn admins(&self) -> &[AdminUser] {
        &self.admins
    }

    /// Number of configured admins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Returns `true` if no admin is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    /// Check if an email is authorized as an admin.
    #[must_use]
    pub fn is_authorized_admin(&self, email: &str) -> bool {
        self.get_admin_user(email).is_some()
    }

    /// Get admin user by email.
    #[must_use]
    pub fn get_admin_user(&self, email: &str) -> Option<&AdminUser> {
        if email.is_empty() {
            return None;
        }
        self.admins.iter().find(|a| a.email.as_str() == email)
    }

    /// Check if the admin has a specific permission.
    #[must_use]
    pub fn has_permission(&self, email: &str, permission: AdminPermission) -> bool {
        self.get_admin_user(email)
            .is_some_and(|a| a.has_permission(permission))
    }

    /// Check if the admin has any of the given permissions.
    #[must_use]
    pub fn has_any_permission(&self, email: &str, permissions: &[AdminPermission]) -> bool {
        self.get_admin_user(email)
            .is_some_and(|a| permissions.iter().any(|p| a.has_permission(*p)))
    }

    /// Check if the admin has all of the given permissions.
    #[must_use]
    pub fn has_all_permissions(&self, email: &str, permissions: &[AdminPermission]) -> bool {
        self.get_admin_user(email)
            .is_some_and(|a| permissions.iter().all(|p| a.has_permission(*p)))
    }

    /// Check if the admin has `role` or a more privileged one.
    #[must_use]
    pub fn has_role(&self, email: &str, role: AdminRole) -> bool {
        self.get_admin_user(email)
            .is_some_and(|a| a.role.at_least(role))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(email: &str, role: AdminRole) -> AdminEntry {
        AdminEntry {
            email: Email::parse(email).unwrap(),
            name: email.split('@').next().unwrap().to_string(),
            role,
        }
    }

    fn directory() -> AdminDirectory {
        AdminDirectory::new(vec![
            entry("root@thala.app", AdminRole::SuperAdmin),
            entry("ops@thala.app", AdminRole::Admin),
            entry("mod@thala.app", AdminRole::Moderator),
            entry("view@thala.app", AdminRole::Viewer),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let result = AdminDirectory::new(vec![
            entry("a@thala.app", AdminRole::Admin),
            entry("a@thala.app", AdminRole::Viewer),
        ]);
        assert_eq!(
            result.unwrap_err(),
            DirectoryError::DuplicateAdmin("a@thala.app".to_string())
        );
    }

    #[test]
    fn test_unknown_email_has_no_permissions() {
        let dir = directory();
        for email in ["", "stranger@thala.app", "ROOT@thala.app", "not an email"] {
            assert!(!dir.is_authorized_admin(email));
            assert!(dir.get_admin_user(email).is_none());
            for permission in AdminPermission::ALL {
                assert!(!dir.has_permission(email, permission));
            }
            assert!(!dir.has_any_permission(email, &AdminPermission::ALL));
            assert!(!dir.has_all_permissions(email, &[]));
            for role in AdminRole::ALL {
                assert!(!dir.has_role(email, role));
            }
        }
    }

    #[test]
    fn test_has_role_follows_rank() {
        let dir = directory();
        let admins = [
            ("root@thala.app", AdminRole::SuperAdmin),
            ("ops@thala.app", AdminRole::Admin),
            ("mod@thala.app", AdminRole::Moderator),
            ("view@thala.app", AdminRole::Viewer),
        ];
        for (email, configured) in admins {
            for requested in AdminRole::ALL {
                assert_eq!(
                    dir.has_role(email, requested),
                    configured.rank() >= requested.rank(),
                    "{email} requesting {requested}"
                );
            }
        }
    }

    #[test]
    fn test_permissions_derived_from_role() {
        let dir = directory();
        let admin = dir.get_admin_user("mod@thala.app").unwrap();
        assert_eq!(admin.permissions, AdminRole::Moderator.permissions());
        assert!(dir.has_permission("mod@thala.app", AdminPermission::DeleteVideos));
        assert!(!dir.has_permission("mod@thala.app", AdminPermission::DeleteUsers));
    }

    #[test]
    fn test_any_and_all_permissions() {
        let dir = directory();
        let mixed = [AdminPermission::ViewUsers, AdminPermission::ManageAdmins];

        assert!(dir.has_any_permission("view@thala.app", &mixed));
        assert!(!dir.has_all_permissions("view@thala.app", &mixed));
        assert!(dir.has_all_permissions("root@thala.app", &mixed));
        assert!(!dir.has_any_permission("view@thala.app", &[]));
        assert!(dir.has_all_permissions("view@thala.app", &[]));
    }

    #[test]
    fn test_entry_deserializes_from_json() {
        let entry: AdminEntry = serde_json::from_str(
            r#"{"email":"root@thala.app","name":"Root","role":"super_admin"}"#,
        )
        .unwrap();
        assert_eq!(entry.role, AdminRole::SuperAdmin);
        assert_eq!(entry.email.as_str(), "root@thala.app");
    }
}
