//! Current admin profile.

use axum::{Json, Router, extract::State, http::Uri, routing::get};
use serde::Serialize;

use thala_core::{AdminPermission, AdminRole, Email, GuardChain};

use crate::error::AppError;
use crate::middleware::{ClientInfo, OptionalAdminAuth, guarded};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/me", get(me))
}

/// The signed-in admin as the dashboard sees it.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub permissions: Vec<AdminPermission>,
}

/// GET /api/admin/me
///
/// # Errors
///
/// 401 without a session; 404 if the session email is no longer in the
/// admin directory.
#[tracing::instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
) -> Result<Json<MeResponse>, AppError> {
    let directory = state.directory();
    guarded(
        &state,
        &GuardChain::authenticated(),
        auth.identity(),
        &client,
        uri.path(),
        |identity| async move {
            let admin = directory
                .get_admin_user(identity.email.as_str())
                .ok_or_else(|| AppError::NotFound("Admin user not found".to_string()))?;

            Ok(Json(MeResponse {
                email: admin.email.clone(),
                name: admin.name.clone(),
                role: admin.role,
                permissions: admin.permissions.clone(),
            }))
        },
    )
    .await
}
