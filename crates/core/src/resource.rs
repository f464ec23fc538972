//! Catalogue of backend resources managed from the admin panel.
//!
//! Each resource maps to a backend path segment, the permissions guarding
//! its view/edit/delete operations, and the audit actions its mutations
//! produce.

use serde::{Deserialize, Serialize};

use crate::audit::AuditAction;
use crate::types::AdminPermission;

/// Mutating operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

/// A backend resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Users,
    Events,
    Videos,
    Music,
    Archive,
    Community,
    HostRequests,
}

impl ResourceKind {
    pub const ALL: [Self; 7] = [
        Self::Users,
        Self::Events,
        Self::Videos,
        Self::Music,
        Self::Archive,
        Self::Community,
        Self::HostRequests,
    ];

    /// Path segment in admin routes (`/api/admin/{segment}`).
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Events => "events",
            Self::Videos => "videos",
            Self::Music => "music",
            Self::Archive => "archive",
            Self::Community => "community",
            Self::HostRequests => "host-requests",
        }
    }

    /// Path on the backend API, relative to its base URL.
    #[must_use]
    pub const fn backend_path(self) -> &'static str {
        match self {
            Self::Users => "/users",
            Self::Events => "/events",
            Self::Videos => "/videos",
            Self::Music => "/music",
            Self::Archive => "/archive",
            Self::Community => "/community",
            Self::HostRequests => "/community/host-requests",
        }
    }

    /// Singular name recorded as an audit entry's resource type.
    #[must_use]
    pub const fn audit_type(self) -> &'static str {
        match self {
            Self::Users => "user",
            Self::Events => "event",
            Self::Videos => "video",
            Self::Music => "music",
            Self::Archive => "archive",
            Self::Community => "community",
            Self::HostRequests => "host_request",
        }
    }

    /// Permission required to read the resource.
    #[must_use]
    pub const fn view_permission(self) -> AdminPermission {
        match self {
            Self::Users => AdminPermission::ViewUsers,
            Self::Events => AdminPermission::ViewEvents,
            Self::Videos => AdminPermission::ViewVideos,
            Self::Music => AdminPermission::ViewMusic,
            Self::Archive => AdminPermission::ViewArchive,
            Self::Community | Self::HostRequests => AdminPermission::ViewCommunities,
        }
    }

    /// Permission required for `mutation`.
    #[must_use]
    pub const fn mutation_permission(self, mutation: Mutation) -> AdminPermission {
        match (self, mutation) {
            (Self::Users, Mutation::Delete) => AdminPermission::DeleteUsers,
            (Self::Users, _) => AdminPermission::EditUsers,
            (Self::Events, Mutation::Delete) => AdminPermission::DeleteEvents,
            (Self::Events, _) => AdminPermission::EditEvents,
            (Self::Videos, Mutation::Delete) => AdminPermission::DeleteVideos,
            (Self::Videos, _) => AdminPermission::EditVideos,
            (Self::Music, Mutation::Delete) => AdminPermission::DeleteMusic,
            (Self::Music, _) => AdminPermission::EditMusic,
            (Self::Archive, Mutation::Delete) => AdminPermission::DeleteArchive,
            (Self::Archive, _) => AdminPermission::EditArchive,
            (Self::Community | Self::HostRequests, Mutation::Delete) => {
                AdminPermission::DeleteCommunities
            }
            (Self::Community | Self::HostRequests, _) => AdminPermission::EditCommunities,
        }
    }

    /// Audit action recorded for `mutation`.
    #[must_use]
    pub const fn audit_action(self, mutation: Mutation) -> AuditAction {
        match (self, mutation) {
            (Self::Users, Mutation::Create) => AuditAction::UserCreate,
            (Self::Users, Mutation::Update) => AuditAction::UserUpdate,
            (Self::Users, Mutation::Delete) => AuditAction::UserDelete,
            (Self::Events, Mutation::Create) => AuditAction::EventCreate,
            (Self::Events, Mutation::Update) => AuditAction::EventUpdate,
            (Self::Events, Mutation::Delete) => AuditAction::EventDelete,
            (Self::Videos, Mutation::Create) => AuditAction::VideoCreate,
            (Self::Videos, Mutation::Update) => AuditAction::VideoUpdate,
            (Self::Videos, Mutation::Delete) => AuditAction::VideoDelete,
            (Self::Music, Mutation::Create) => AuditAction::MusicCreate,
            (Self::Music, Mutation::Update) => AuditAction::MusicUpdate,
            (Self::Music, Mutation::Delete) => AuditAction::MusicDelete,
            (Self::Archive, Mutation::Create) => AuditAction::ArchiveCreate,
            (Self::Archive, Mutation::Update) => AuditAction::ArchiveUpdate,
            (Self::Archive, Mutation::Delete) => AuditAction::ArchiveDelete,
            (Self::Community | Self::HostRequests, Mutation::Create) => {
                AuditAction::CommunityCreate
            }
            (Self::Community | Self::HostRequests, Mutation::Update) => {
                AuditAction::CommunityUpdate
            }
            (Self::Community | Self::HostRequests, Mutation::Delete) => {
                AuditAction::CommunityDelete
            }
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.segment() == s)
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}

/// Target of a moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationTarget {
    Video,
    Message,
    User,
}

impl ModerationTarget {
    /// Parse the `resourceType` field of a moderation request.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(Self::Video),
            "message" => Some(Self::Message),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Message => "message",
            Self::User => "user",
        }
    }

    /// Backend collection path (`/videos`, `/messages`, `/users`).
    #[must_use]
    pub const fn backend_path(self) -> &'static str {
        match self {
            Self::Video => "/videos",
            Self::Message => "/messages",
            Self::User => "/users",
        }
    }

    /// Permission required to moderate this target.
    #[must_use]
    pub const fn permission(self) -> AdminPermission {
        match self {
            Self::Video => AdminPermission::DeleteVideos,
            Self::Message => AdminPermission::DeleteMessages,
            Self::User => AdminPermission::DeleteUsers,
        }
    }

    /// Audit action recorded after a successful moderation.
    #[must_use]
    pub const fn audit_action(self) -> AuditAction {
        match self {
            Self::Video => AuditAction::VideoDelete,
            Self::Message => AuditAction::MessageDelete,
            Self::User => AuditAction::UserDelete,
        }
    }
}

/// A moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    /// Remove the resource.
    Delete,
    /// Mark the resource as flagged with a reason.
    Flag,
}

impl ModerationAction {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delete" => Some(Self::Delete),
            "flag" => Some(Self::Flag),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Flag => "flag",
        }
    }

    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::Flag => "flagged",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::AdminRole;

    #[test]
    fn test_segment_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.segment().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("messages".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_host_requests_use_community_permissions() {
        assert_eq!(
            ResourceKind::HostRequests.view_permission(),
            AdminPermission::ViewCommunities
        );
        assert_eq!(
            ResourceKind::HostRequests.mutation_permission(Mutation::Update),
            AdminPermission::EditCommunities
        );
        assert_eq!(
            ResourceKind::HostRequests.backend_path(),
            "/community/host-requests"
        );
    }

    #[test]
    fn test_viewer_can_read_every_resource() {
        for kind in ResourceKind::ALL {
            assert!(AdminRole::Viewer.grants(kind.view_permission()), "{kind}");
        }
    }

    #[test]
    fn test_moderation_targets() {
        assert_eq!(ModerationTarget::parse("video"), Some(ModerationTarget::Video));
        assert_eq!(ModerationTarget::parse("event"), None);
        assert_eq!(
            ModerationTarget::User.permission(),
            AdminPermission::DeleteUsers
        );
        assert_eq!(
            ModerationTarget::Message.audit_action(),
            AuditAction::MessageDelete
        );
        assert_eq!(ModerationAction::parse("flag"), Some(ModerationAction::Flag));
        assert_eq!(ModerationAction::parse("ban"), None);
    }
}
