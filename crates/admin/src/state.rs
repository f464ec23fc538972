//! Application state shared across handlers.

use std::sync::Arc;

use thala_core::AdminDirectory;

use crate::audit::AuditLog;
use crate::backend::{BackendClient, GatewayError};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    directory: AdminDirectory,
    audit: AuditLog,
    backend: BackendClient,
}

impl AppState {
    /// Build state, creating the backend client from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend HTTP client cannot be built.
    pub fn new(
        config: AdminConfig,
        directory: AdminDirectory,
        audit: AuditLog,
    ) -> Result<Self, GatewayError> {
        let backend = BackendClient::from_config(&config)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                directory,
                audit,
                backend,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The configured admins.
    #[must_use]
    pub fn directory(&self) -> &AdminDirectory {
        &self.inner.directory
    }

    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("admins", &self.inner.directory.len())
            .field("backend", &self.inner.backend)
            .finish_non_exhaustive()
    }
}
