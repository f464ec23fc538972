//! Audit log service.
//!
//! [`AuditLog`] stamps entries, hands them to an injected [`AuditStore`] and
//! answers the four read queries. Every read filters the full log, keeps the
//! last `limit` matches and returns them newest first.

mod store;

pub use store::{AuditFilter, AuditStore, MemoryAuditStore};

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use thala_core::{AuditAction, AuditLogEntry, NewAuditEntry};

/// Default number of entries returned by the read queries.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Audit log backed by an [`AuditStore`].
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
}

impl AuditLog {
    #[must_use]
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// An audit log held in process memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryAuditStore::new()))
    }

    /// Stamp `entry` with the current time and append it.
    ///
    /// # Errors
    ///
    /// Returns `AuditError` if the store rejects the entry.
    pub async fn log_audit_action(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AuditError> {
        let entry = entry.stamp(Utc::now());
        tracing::info!(
            target: "audit",
            admin = %entry.entry.admin_email,
            action = %entry.action(),
            resource_type = entry.entry.resource_type.as_deref(),
            resource_id = entry.entry.resource_id.as_deref(),
            "{} performed {}",
            entry.entry.admin_email,
            entry.action()
        );
        self.store.append(entry.clone()).await?;
        Ok(entry)
    }

    /// Like [`Self::log_audit_action`], but a store failure is only logged.
    ///
    /// Used on request paths where the action has already happened and the
    /// response must not depend on the audit write.
    pub async fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.log_audit_action(entry).await {
            tracing::error!(error = %e, "Failed to write audit entry");
        }
    }

    /// The `limit` most recent entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AuditError` if the store cannot be read.
    pub async fn query(
        &self,
        filter: &AuditFilter,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        let mut entries = self.store.entries(filter).await?;
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries.reverse();
        Ok(entries)
    }

    /// # Errors
    ///
    /// Returns `AuditError` if the store cannot be read.
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.query(&AuditFilter::default(), limit).await
    }

    /// # Errors
    ///
    /// Returns `AuditError` if the store cannot be read.
    pub async fn by_admin(
        &self,
        admin_email: &str,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.query(&AuditFilter::by_admin(admin_email), limit).await
    }

    /// # Errors
    ///
    /// Returns `AuditError` if the store cannot be read.
    pub async fn by_action(
        &self,
        action: AuditAction,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.query(&AuditFilter::by_action(action), limit).await
    }

    /// # Errors
    ///
    /// Returns `AuditError` if the store cannot be read.
    pub async fn by_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.query(&AuditFilter::by_resource(resource_type, resource_id), limit)
            .await
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use thala_core::{DetailValue, Email};

    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_sixty_logged_fifty_newest_first() {
        let log = AuditLog::in_memory();
        for n in 0..60 {
            log.log_audit_action(
                NewAuditEntry::new(AuditAction::VideoUpdate, email("ops@thala.app"))
                    .resource("video", n.to_string()),
            )
            .await
            .unwrap();
        }

        let recent = log.recent(50).await.unwrap();
        assert_eq!(recent.len(), 50);
        let ids: Vec<_> = recent
            .iter()
            .map(|e| e.entry.resource_id.clone().unwrap())
            .collect();
        let expected: Vec<_> = (10..60).rev().map(|n: i32| n.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_limit_larger_than_log() {
        let log = AuditLog::in_memory();
        log.log_audit_action(NewAuditEntry::new(AuditAction::Login, email("a@thala.app")))
            .await
            .unwrap();
        assert_eq!(log.recent(DEFAULT_AUDIT_LIMIT).await.unwrap().len(), 1);
        assert!(log.recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_queries() {
        let log = AuditLog::in_memory();
        log.record(NewAuditEntry::new(AuditAction::Login, email("a@thala.app")))
            .await;
        log.record(
            NewAuditEntry::new(AuditAction::UserDelete, email("b@thala.app"))
                .resource("user", "42")
                .detail("reason", "spam"),
        )
        .await;
        log.record(NewAuditEntry::new(AuditAction::Logout, email("a@thala.app")))
            .await;

        let a = log.by_admin("a@thala.app", 10).await.unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].action(), AuditAction::Logout);

        let deletes = log.by_action(AuditAction::UserDelete, 10).await.unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(
            deletes[0].entry.details.get("reason"),
            Some(&DetailValue::Text("spam".to_string()))
        );

        assert_eq!(log.by_resource("user", "42", 10).await.unwrap().len(), 1);
        assert!(log.by_resource("user", "43", 10).await.unwrap().is_empty());
        assert!(log.by_admin("nobody@thala.app", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_are_timestamped_in_order() {
        let log = AuditLog::in_memory();
        let first = log
            .log_audit_action(NewAuditEntry::new(AuditAction::Login, email("a@thala.app")))
            .await
            .unwrap();
        let second = log
            .log_audit_action(NewAuditEntry::new(AuditAction::Logout, email("a@thala.app")))
            .await
            .unwrap();
        assert!(second.timestamp >= first.timestamp);
    }
}
