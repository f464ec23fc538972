//! Audit log queries.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::Uri,
    routing::get,
};
use serde::Deserialize;

use thala_core::{AdminPermission, AuditAction, AuditLogEntry, GuardChain};

use crate::audit::{AuditFilter, DEFAULT_AUDIT_LIMIT};
use crate::error::AppError;
use crate::middleware::{ClientInfo, OptionalAdminAuth, guarded};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/audit", get(list))
}

/// Query string of `GET /api/admin/audit`. Given filters are combined.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
    pub admin: Option<String>,
    pub action: Option<AuditAction>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
}

impl AuditQuery {
    fn filter(self) -> Result<AuditFilter, AppError> {
        let resource = match (self.resource_type, self.resource_id) {
            (Some(t), Some(id)) => Some((t, id)),
            (None, None) => None,
            _ => {
                return Err(AppError::BadRequest(
                    "resource_type and resource_id must be given together".to_string(),
                ));
            }
        };
        Ok(AuditFilter {
            admin_email: self.admin,
            action: self.action,
            resource,
        })
    }
}

/// GET /api/admin/audit
///
/// Newest first, at most `limit` entries (default 100).
///
/// # Errors
///
/// 401 without a session; 403 without `view_audit_logs`; 400 for an
/// unparseable query string.
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    let audit = state.audit();
    guarded(
        &state,
        &GuardChain::authenticated().require(AdminPermission::ViewAuditLogs),
        auth.identity(),
        &client,
        uri.path(),
        |_| async move {
            let Query(query) =
                query.map_err(|e| AppError::BadRequest(format!("Invalid audit query: {e}")))?;
            let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
            let entries = audit.query(&query.filter()?, limit).await?;
            Ok(Json(entries))
        },
    )
    .await
}
