//! Audit storage backends.

use std::sync::RwLock;

use async_trait::async_trait;

use thala_core::{AuditAction, AuditLogEntry};

use super::AuditError;

/// Selects entries from a store. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub admin_email: Option<String>,
    pub action: Option<AuditAction>,
    /// `(resource_type, resource_id)`
    pub resource: Option<(String, String)>,
}

impl AuditFilter {
    #[must_use]
    pub fn by_admin(email: impl Into<String>) -> Self {
        Self {
            admin_email: Some(email.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_action(action: AuditAction) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_resource(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource: Some((resource_type.into(), resource_id.into())),
            ..Self::default()
        }
    }

    /// Returns `true` if `entry` satisfies every set field.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(email) = &self.admin_email {
            if entry.admin_email() != email {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action() != action {
                return false;
            }
        }
        if let Some((resource_type, resource_id)) = &self.resource {
            if !entry.concerns(resource_type, resource_id) {
                return false;
            }
        }
        true
    }
}

/// Trait for audit storage backends.
///
/// Entries are append-only; implementations never modify or drop them.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an entry.
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError>;

    /// Entries matching `filter`, oldest first.
    async fn entries(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, AuditError>;
}

/// Process-local store. Contents are lost on restart and grow without bound.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        self.entries
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {e}")))?
            .push(entry);
        Ok(())
    }

    async fn entries(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {e}")))?;
        Ok(entries.iter().filter(|e| filter.matches(e)).cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use thala_core::{Email, NewAuditEntry};

    use super::*;

    fn entry(email: &str, action: AuditAction, resource: Option<(&str, &str)>) -> AuditLogEntry {
        let mut new = NewAuditEntry::new(action, Email::parse(email).unwrap());
        if let Some((t, id)) = resource {
            new = new.resource(t, id);
        }
        new.stamp(Utc::now())
    }

    #[tokio::test]
    async fn test_memory_store_filters_in_append_order() {
        let store = MemoryAuditStore::new();
        store
            .append(entry("a@thala.app", AuditAction::Login, None))
            .await
            .unwrap();
        store
            .append(entry(
                "b@thala.app",
                AuditAction::VideoDelete,
                Some(("video", "v1")),
            ))
            .await
            .unwrap();
        store
            .append(entry("a@thala.app", AuditAction::Logout, None))
            .await
            .unwrap();

        let all = store.entries(&AuditFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].action(), AuditAction::Login);

        let by_a = store
            .entries(&AuditFilter::by_admin("a@thala.app"))
            .await
            .unwrap();
        let actions: Vec<_> = by_a.iter().map(AuditLogEntry::action).collect();
        assert_eq!(actions, [AuditAction::Login, AuditAction::Logout]);

        let by_video = store
            .entries(&AuditFilter::by_resource("video", "v1"))
            .await
            .unwrap();
        assert_eq!(by_video.len(), 1);
        assert_eq!(by_video[0].admin_email(), "b@thala.app");
    }

    #[test]
    fn test_filter_fields_combine() {
        let e = entry("a@thala.app", AuditAction::UserDelete, Some(("user", "7")));
        let filter = AuditFilter {
            admin_email: Some("a@thala.app".to_string()),
            action: Some(AuditAction::UserDelete),
            resource: Some(("user".to_string(), "7".to_string())),
        };
        assert!(filter.matches(&e));

        let filter = AuditFilter {
            action: Some(AuditAction::UserUpdate),
            ..filter
        };
        assert!(!filter.matches(&e));
    }
}
