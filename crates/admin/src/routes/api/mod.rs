//! JSON API handlers under `/api/admin`.
//!
//! Every handler reads the session with [`OptionalAdminAuth`] and runs its
//! body through [`guarded`]; none of them trusts the route alone.
//!
//! [`OptionalAdminAuth`]: crate::middleware::OptionalAdminAuth
//! [`guarded`]: crate::middleware::guarded

pub mod audit;
pub mod me;
pub mod moderate;
pub mod resources;
pub mod sql;
pub mod stats;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
///
/// Static segments (`me`, `stats`, ...) take priority over the
/// `{resource}` captures in [`resources::router`].
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(me::router())
        .merge(stats::router())
        .merge(moderate::router())
        .merge(sql::router())
        .merge(audit::router())
        .merge(resources::router())
}
