//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Auth (identity forwarded by the auth proxy)
//! GET  /auth/signin                  - Establish a session
//! POST /auth/signout                 - Clear the session
//!
//! # Admin API (JSON)
//! GET  /api/admin/me                 - Current admin, role and permissions
//! GET  /api/admin/stats              - Dashboard counters
//! POST /api/admin/moderate           - Delete or flag a video/message/user
//! POST /api/admin/sql                - Read-only SQL console
//! GET  /api/admin/audit              - Audit log queries
//! GET  /api/admin/{resource}         - List records
//! POST /api/admin/{resource}         - Create a record
//! GET  /api/admin/{resource}/{id}    - Fetch a record
//! PUT  /api/admin/{resource}/{id}    - Update a record
//! DELETE /api/admin/{resource}/{id}  - Delete a record
//! ```

pub mod api;
pub mod auth;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(api::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
