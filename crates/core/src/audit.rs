//! Audit log records for admin actions.
//!
//! An [`AuditLogEntry`] is written for every mutating admin action and is
//! never modified afterwards. Storage lives in the admin crate; this module
//! only defines the records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Email;

/// Kind of admin action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth
    Login,
    Logout,
    UnauthorizedAccess,

    // Users
    UserCreate,
    UserUpdate,
    UserDelete,
    UserView,

    // Videos
    VideoCreate,
    VideoUpdate,
    VideoDelete,

    // Events
    EventCreate,
    EventUpdate,
    EventDelete,

    // Archive
    ArchiveCreate,
    ArchiveUpdate,
    ArchiveDelete,

    // Music
    MusicCreate,
    MusicUpdate,
    MusicDelete,

    // Communities
    CommunityCreate,
    CommunityUpdate,
    CommunityDelete,

    // Messages
    MessageView,
    MessageDelete,

    // Settings
    SettingsUpdate,
}

impl AuditAction {
    /// Snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::UnauthorizedAccess => "unauthorized_access",
            Self::UserCreate => "user_create",
            Self::UserUpdate => "user_update",
            Self::UserDelete => "user_delete",
            Self::UserView => "user_view",
            Self::VideoCreate => "video_create",
            Self::VideoUpdate => "video_update",
            Self::VideoDelete => "video_delete",
            Self::EventCreate => "event_create",
            Self::EventUpdate => "event_update",
            Self::EventDelete => "event_delete",
            Self::ArchiveCreate => "archive_create",
            Self::ArchiveUpdate => "archive_update",
            Self::ArchiveDelete => "archive_delete",
            Self::MusicCreate => "music_create",
            Self::MusicUpdate => "music_update",
            Self::MusicDelete => "music_delete",
            Self::CommunityCreate => "community_create",
            Self::CommunityUpdate => "community_update",
            Self::CommunityDelete => "community_delete",
            Self::MessageView => "message_view",
            Self::MessageDelete => "message_delete",
            Self::SettingsUpdate => "settings_update",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("invalid audit action: {s}"))
    }
}

/// A scalar value in an audit entry's detail map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for DetailValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Free-form details attached to an audit entry.
pub type AuditDetails = BTreeMap<String, DetailValue>;

/// An audit entry before it is stamped with a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub admin_email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: AuditDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    /// Start an entry for `action` performed by `admin_email`.
    #[must_use]
    pub const fn new(action: AuditAction, admin_email: Email) -> Self {
        Self {
            action,
            admin_email,
            admin_name: None,
            resource_type: None,
            resource_id: None,
            details: BTreeMap::new(),
            ip_address: None,
            user_agent: None,
        }
    }

    /// Set the acting admin's display name.
    #[must_use]
    pub fn admin_name(mut self, name: Option<String>) -> Self {
        self.admin_name = name;
        self
    }

    /// Set the affected resource.
    #[must_use]
    pub fn resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add a detail field.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Set request metadata.
    #[must_use]
    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Stamp the entry with `timestamp`.
    #[must_use]
    pub const fn stamp(self, timestamp: DateTime<Utc>) -> AuditLogEntry {
        AuditLogEntry {
            timestamp,
            entry: self,
        }
    }
}

/// An immutable audit log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: NewAuditEntry,
}

impl AuditLogEntry {
    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.entry.action
    }

    #[must_use]
    pub fn admin_email(&self) -> &str {
        self.entry.admin_email.as_str()
    }

    /// Returns `true` if the entry concerns `resource_type`/`resource_id`.
    #[must_use]
    pub fn concerns(&self, resource_type: &str, resource_id: &str) -> bool {
        self.entry.resource_type.as_deref() == Some(resource_type)
            && self.entry.resource_id.as_deref() == Some(resource_id)
    }
}
