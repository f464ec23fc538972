//! Authentication route handlers for admin.
//!
//! There is no login form. The admin panel sits behind an identity-aware
//! proxy that authenticates the user and forwards the verified email in a
//! header; sign-in turns that header into a session for admins listed in
//! the directory.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use serde::Serialize;
use tower_sessions::Session;

use thala_core::{AdminRole, AuditAction, Email, NewAuditEntry};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{ClientInfo, OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", get(signin))
        .route("/auth/signout", post(signout))
}

/// Response for a successful sign-in.
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub success: bool,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
}

/// Response for sign-out.
#[derive(Debug, Serialize)]
pub struct SignoutResponse {
    pub success: bool,
}

/// Establish a session from the proxy-forwarded identity.
///
/// GET /auth/signin
#[tracing::instrument(skip_all)]
async fn signin(
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    headers: HeaderMap,
) -> Result<Json<SigninResponse>, AppError> {
    let config = state.config();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let Some(raw_email) = header(config.identity_header.as_str()) else {
        tracing::warn!(header = %config.identity_header, "Sign-in without forwarded identity");
        return Err(AppError::Unauthorized);
    };
    let email = Email::parse(raw_email).map_err(|e| {
        tracing::warn!(error = %e, "Sign-in with malformed forwarded email");
        AppError::Unauthorized
    })?;
    let name = header(config.identity_name_header.as_str()).map(String::from);

    let Some(admin) = state.directory().get_admin_user(email.as_str()) else {
        tracing::warn!(email = %email, "Sign-in refused: not an admin");
        state
            .audit()
            .record(
                NewAuditEntry::new(AuditAction::UnauthorizedAccess, email)
                    .admin_name(name)
                    .detail("path", "/auth/signin")
                    .client(client.ip_address, client.user_agent),
            )
            .await;
        return Err(AppError::Forbidden("Access denied".to_string()));
    };

    let current = CurrentAdmin::new(admin.email.clone(), name.or_else(|| Some(admin.name.clone())));
    set_current_admin(&session, &current).await?;
    set_sentry_user(current.email.as_str(), current.name.as_deref());

    state
        .audit()
        .record(
            NewAuditEntry::new(AuditAction::Login, current.email.clone())
                .admin_name(current.name.clone())
                .client(client.ip_address, client.user_agent),
        )
        .await;
    tracing::info!(email = %current.email, role = admin.role.as_str(), "Admin signed in");

    Ok(Json(SigninResponse {
        success: true,
        email: admin.email.clone(),
        name: admin.name.clone(),
        role: admin.role,
    }))
}

/// Clear the session.
///
/// POST /auth/signout
#[tracing::instrument(skip_all)]
async fn signout(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
    client: ClientInfo,
) -> Result<Json<SignoutResponse>, AppError> {
    clear_current_admin(&session).await?;
    clear_sentry_user();

    if let Some(admin) = admin {
        state
            .audit()
            .record(
                NewAuditEntry::new(AuditAction::Logout, admin.email.clone())
                    .admin_name(admin.name)
                    .client(client.ip_address, client.user_agent),
            )
            .await;
        tracing::info!(email = %admin.email, "Admin signed out");
    }

    Ok(Json(SignoutResponse { success: true }))
}
