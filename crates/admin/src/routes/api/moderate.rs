//! Content moderation: delete or flag a video, message or user.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::Uri,
    routing::post,
};
use serde::{Deserialize, Serialize};

use thala_core::{AuditAction, GuardChain, ModerationAction, ModerationTarget, NewAuditEntry};

use crate::backend::{GatewayError, RecordId};
use crate::error::AppError;
use crate::middleware::{ClientInfo, OptionalAdminAuth, guarded};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/moderate", post(moderate))
}

/// Moderation request body. Fields are checked in order: type, permission,
/// action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<RecordId>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModerateResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/admin/moderate
///
/// # Errors
///
/// 401 without a session; 400 for an unknown resource type, a missing id or
/// an unknown action; 403 if the admin lacks the target's delete
/// permission; 500 if the backend refuses or cannot be reached.
#[tracing::instrument(skip_all)]
pub async fn moderate(
    State(state): State<AppState>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
    body: Result<Json<ModerateRequest>, JsonRejection>,
) -> Result<Json<ModerateResponse>, AppError> {
    let app = &state;
    let client_ref = &client;
    let path = uri.path();
    guarded(
        &state,
        &GuardChain::authenticated(),
        auth.identity(),
        &client,
        path,
        |identity| async move {
            let Json(request) =
                body.map_err(|_| AppError::BadRequest("Invalid request body".to_string()))?;

            let target = request
                .resource_type
                .as_deref()
                .and_then(ModerationTarget::parse)
                .ok_or_else(|| AppError::BadRequest("Invalid resource type".to_string()))?;

            let permission = target.permission();
            if !app
                .directory()
                .has_permission(identity.email.as_str(), permission)
            {
                tracing::warn!(
                    admin = %identity.email,
                    permission = permission.as_str(),
                    "Moderation refused"
                );
                app
                    .audit()
                    .record(
                        NewAuditEntry::new(AuditAction::UnauthorizedAccess, identity.email)
                            .admin_name(identity.name)
                            .detail("permission", permission.as_str())
                            .detail("path", path)
                            .client(client_ref.ip_address.clone(), client_ref.user_agent.clone()),
                    )
                    .await;
                return Err(AppError::Forbidden("Insufficient permissions".to_string()));
            }

            let action = request
                .action
                .as_deref()
                .and_then(ModerationAction::parse)
                .ok_or_else(|| AppError::BadRequest("Invalid action".to_string()))?;

            let resource_id = request
                .resource_id
                .map(|id| id.to_string())
                .ok_or_else(|| AppError::BadRequest("Invalid resource id".to_string()))?;

            app
                .backend()
                .moderate(target, &resource_id, action, request.reason.as_deref())
                .await
                .map_err(|e| match e {
                    GatewayError::Status { status, .. } => {
                        AppError::Internal(format!("Moderation action failed: {status}"))
                    }
                    other => AppError::Gateway(other),
                })?;

            app
                .audit()
                .record(
                    NewAuditEntry::new(target.audit_action(), identity.email.clone())
                        .admin_name(identity.name.clone())
                        .resource(target.as_str(), resource_id.clone())
                        .detail("moderationAction", action.as_str())
                        .detail("reason", request.reason)
                        .client(client_ref.ip_address.clone(), client_ref.user_agent.clone()),
                )
                .await;

            tracing::info!(
                admin = %identity.email,
                target = target.as_str(),
                resource_id = %resource_id,
                action = action.as_str(),
                "Moderation action applied"
            );

            Ok(Json(ModerateResponse {
                success: true,
                message: format!("{} {} successfully", target.as_str(), action.past_tense()),
            }))
        },
    )
    .await
}
