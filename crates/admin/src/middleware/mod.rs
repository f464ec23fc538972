//! HTTP middleware for admin.
//!
//! Layer order, outermost first (see [`crate::app`] and `main.rs`):
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (signed cookie, in-memory store)
//!
//! Authorization is not a layer; each handler runs its guard chain through
//! [`auth::guarded`].

pub mod auth;
pub mod session;

pub use auth::{ClientInfo, OptionalAdminAuth, clear_current_admin, guarded, set_current_admin};
pub use session::{SESSION_COOKIE_NAME, with_session_layer};
