//! Admin roles and the permissions each role grants.

use serde::{Deserialize, Serialize};

/// Error returned when a role or permission name is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseRoleError {
    /// Unknown role name.
    #[error("invalid admin role: {0}")]
    Role(String),
    /// Unknown permission name.
    #[error("invalid admin permission: {0}")]
    Permission(String),
}

/// Admin role with different permission levels.
///
/// Roles are totally ordered: `Viewer < Moderator < Admin < SuperAdmin`.
/// The derived `Ord` follows declaration order, so keep the variants sorted
/// from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Read-only access to content.
    Viewer,
    /// Content moderation (videos, events, communities, messages).
    Moderator,
    /// Full content management, no admin or audit management.
    Admin,
    /// Full access to all admin features.
    SuperAdmin,
}

impl AdminRole {
    /// All roles, least privileged first.
    pub const ALL: [Self; 4] = [Self::Viewer, Self::Moderator, Self::Admin, Self::SuperAdmin];

    /// Position of the role in the privilege order (0 = viewer).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Viewer => 0,
            Self::Moderator => 1,
            Self::Admin => 2,
            Self::SuperAdmin => 3,
        }
    }

    /// Returns `true` if this role is at least as privileged as `other`.
    #[must_use]
    pub const fn at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Snake-case name used in configuration and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// The fixed permission set granted by this role.
    #[must_use]
    pub const fn permissions(self) -> &'static [AdminPermission] {
        match self {
            Self::SuperAdmin => &AdminPermission::ALL,
            Self::Admin => ADMIN_PERMISSIONS,
            Self::Moderator => MODERATOR_PERMISSIONS,
            Self::Viewer => VIEWER_PERMISSIONS,
        }
    }

    /// Returns `true` if the role grants `permission`.
    #[must_use]
    pub fn grants(self, permission: AdminPermission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError::Role(s.to_string()))
    }
}

/// An atomic admin capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    // Users
    ViewUsers,
    EditUsers,
    DeleteUsers,

    // Videos
    ViewVideos,
    EditVideos,
    DeleteVideos,

    // Events
    ViewEvents,
    EditEvents,
    DeleteEvents,

    // Archive
    ViewArchive,
    EditArchive,
    DeleteArchive,

    // Music
    ViewMusic,
    EditMusic,
    DeleteMusic,

    // Communities
    ViewCommunities,
    EditCommunities,
    DeleteCommunities,

    // Messages
    ViewMessages,
    DeleteMessages,

    // Settings
    ViewSettings,
    EditSettings,

    // System
    ViewAuditLogs,
    ManageAdmins,
}

impl AdminPermission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 24] = [
        Self::ViewUsers,
        Self::EditUsers,
        Self::DeleteUsers,
        Self::ViewVideos,
        Self::EditVideos,
        Self::DeleteVideos,
        Self::ViewEvents,
        Self::EditEvents,
        Self::DeleteEvents,
        Self::ViewArchive,
        Self::EditArchive,
        Self::DeleteArchive,
        Self::ViewMusic,
        Self::EditMusic,
        Self::DeleteMusic,
        Self::ViewCommunities,
        Self::EditCommunities,
        Self::DeleteCommunities,
        Self::ViewMessages,
        Self::DeleteMessages,
        Self::ViewSettings,
        Self::EditSettings,
        Self::ViewAuditLogs,
        Self::ManageAdmins,
    ];

    /// Snake-case name used in JSON and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewUsers => "view_users",
            Self::EditUsers => "edit_users",
            Self::DeleteUsers => "delete_users",
            Self::ViewVideos => "view_videos",
            Self::EditVideos => "edit_videos",
            Self::DeleteVideos => "delete_videos",
            Self::ViewEvents => "view_events",
            Self::EditEvents => "edit_events",
            Self::DeleteEvents => "delete_events",
            Self::ViewArchive => "view_archive",
            Self::EditArchive => "edit_archive",
            Self::DeleteArchive => "delete_archive",
            Self::ViewMusic => "view_music",
            Self::EditMusic => "edit_music",
            Self::DeleteMusic => "delete_music",
            Self::ViewCommunities => "view_communities",
            Self::EditCommunities => "edit_communities",
            Self::DeleteCommunities => "delete_communities",
            Self::ViewMessages => "view_messages",
            Self::DeleteMessages => "delete_messages",
            Self::ViewSettings => "view_settings",
            Self::EditSettings => "edit_settings",
            Self::ViewAuditLogs => "view_audit_logs",
            Self::ManageAdmins => "manage_admins",
        }
    }
}

impl std::fmt::Display for AdminPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminPermission {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| ParseRoleError::Permission(s.to_string()))
    }
}

const ADMIN_PERMISSIONS: &[AdminPermission] = &[
    AdminPermission::ViewUsers,
    AdminPermission::EditUsers,
    AdminPermission::ViewVideos,
    AdminPermission::EditVideos,
    AdminPermission::DeleteVideos,
    AdminPermission::ViewEvents,
    AdminPermission::EditEvents,
    AdminPermission::DeleteEvents,
    AdminPermission::ViewArchive,
    AdminPermission::EditArchive,
    AdminPermission::DeleteArchive,
    AdminPermission::ViewMusic,
    AdminPermission::EditMusic,
    AdminPermission::DeleteMusic,
    AdminPermission::ViewCommunities,
    AdminPermission::EditCommunities,
    AdminPermission::ViewMessages,
    AdminPermission::DeleteMessages,
    AdminPermission::ViewSettings,
];

const MODERATOR_PERMISSIONS: &[AdminPermission] = &[
    AdminPermission::ViewUsers,
    AdminPermission::ViewVideos,
    AdminPermission::EditVideos,
    AdminPermission::DeleteVideos,
    AdminPermission::ViewEvents,
    AdminPermission::EditEvents,
    AdminPermission::ViewCommunities,
    AdminPermission::EditCommunities,
    AdminPermission::ViewMessages,
    AdminPermission::DeleteMessages,
];

const VIEWER_PERMISSIONS: &[AdminPermission] = &[
    AdminPermission::ViewUsers,
    AdminPermission::ViewVideos,
    AdminPermission::ViewEvents,
    AdminPermission::ViewArchive,
    AdminPermission::ViewMusic,
    AdminPermission::ViewCommunities,
    AdminPermission::ViewMessages,
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_order() {
        assert!(AdminRole::Viewer < AdminRole::Moderator);
        assert!(AdminRole::Moderator < AdminRole::Admin);
        assert!(AdminRole::Admin < AdminRole::SuperAdmin);
        for (i, role) in AdminRole::ALL.iter().enumerate() {
            assert_eq!(usize::from(role.rank()), i);
        }
    }

    #[test]
    fn test_role_roundtrip() {
        for role in AdminRole::ALL {
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!("root".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_permission_roundtrip() {
        for permission in AdminPermission::ALL {
            assert_eq!(
                permission.as_str().parse::<AdminPermission>().unwrap(),
                permission
            );
            let json = serde_json::to_string(&permission).unwrap();
            assert_eq!(json, format!("\"{}\"", permission.as_str()));
        }
    }

    #[test]
    fn test_super_admin_has_everything() {
        for permission in AdminPermission::ALL {
            assert!(AdminRole::SuperAdmin.grants(permission));
        }
    }

    #[test]
    fn test_only_super_admin_manages_admins() {
        assert!(!AdminRole::Admin.grants(AdminPermission::ManageAdmins));
        assert!(!AdminRole::Admin.grants(AdminPermission::ViewAuditLogs));
        assert!(!AdminRole::Admin.grants(AdminPermission::DeleteUsers));
    }

    #[test]
    fn test_moderator_permissions() {
        assert!(AdminRole::Moderator.grants(AdminPermission::DeleteVideos));
        assert!(AdminRole::Moderator.grants(AdminPermission::DeleteMessages));
        assert!(!AdminRole::Moderator.grants(AdminPermission::ViewArchive));
        assert!(!AdminRole::Moderator.grants(AdminPermission::DeleteEvents));
    }

    #[test]
    fn test_viewer_is_read_only() {
        for permission in AdminRole::Viewer.permissions() {
            assert!(permission.as_str().starts_with("view_"));
        }
    }
}
