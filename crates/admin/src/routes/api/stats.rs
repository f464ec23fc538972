//! Dashboard statistics.

use axum::{Json, Router, extract::State, http::Uri, routing::get};

use thala_core::GuardChain;

use crate::backend::DashboardStats;
use crate::error::AppError;
use crate::middleware::{ClientInfo, OptionalAdminAuth, guarded};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/stats", get(stats))
}

/// GET /api/admin/stats
///
/// # Errors
///
/// 401 without a session (the backend is not called); otherwise the
/// backend's status and message, defaulting to "Failed to fetch stats".
#[tracing::instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
) -> Result<Json<DashboardStats>, AppError> {
    let backend = state.backend();
    guarded(
        &state,
        &GuardChain::authenticated(),
        auth.identity(),
        &client,
        uri.path(),
        |_| async move {
            let stats = backend
                .stats()
                .await
                .map_err(|e| e.or_message("Failed to fetch stats"))?;
            Ok(Json(stats))
        },
    )
    .await
}
