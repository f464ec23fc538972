//! Authentication extractors and the guarded-handler helper for admin.
//!
//! Handlers take [`OptionalAdminAuth`] and hand the session identity to
//! [`guarded`], which runs a [`GuardChain`] before the handler body. A
//! missing session is 401; an admin lacking a permission is 403 and leaves
//! an `unauthorized_access` entry in the audit log.

use std::convert::Infallible;
use std::future::Future;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tower_sessions::Session;

use thala_core::{AuditAction, GuardChain, GuardError, GuardRejection, Identity, NewAuditEntry};

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor for the signed-in admin, if any.
///
/// Never rejects: 401 is decided by the guard chain in [`guarded`]. A
/// missing session layer or an unreadable session both read as signed out.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to read admin session");
                    None
                }),
            None => None,
        };

        Ok(Self(admin))
    }
}

impl OptionalAdminAuth {
    /// The session identity, for guard chains.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.0.as_ref().map(CurrentAdmin::identity)
    }
}

/// Caller metadata recorded on audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Read `x-forwarded-for` (first hop), falling back to `x-real-ip`, and
    /// `user-agent`.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .filter(|v| !v.is_empty())
            .or_else(|| header("x-real-ip"));

        Self {
            ip_address,
            user_agent: header("user-agent"),
        }
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Run `handler` behind `chain`.
///
/// A forbidden, authenticated caller is recorded as `unauthorized_access`
/// with the missing permission and the request path.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` or `AppError::Forbidden` if the chain
/// rejects the request, or the handler's own error.
pub async fn guarded<F, Fut, T>(
    state: &AppState,
    chain: &GuardChain,
    admin: Option<Identity>,
    client: &ClientInfo,
    path: &str,
    handler: F,
) -> Result<T, AppError>
where
    F: FnOnce(Identity) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let caller = admin.clone();
    match chain.run(state.directory(), admin, handler).await {
        Ok(value) => Ok(value),
        Err(GuardError::Rejected(GuardRejection::Forbidden(permission))) => {
            if let Some(identity) = caller {
                tracing::warn!(
                    admin = %identity.email,
                    permission = permission.as_str(),
                    path,
                    "Admin lacks permission"
                );
                state
                    .audit()
                    .record(
                        NewAuditEntry::new(AuditAction::UnauthorizedAccess, identity.email)
                            .admin_name(identity.name)
                            .detail("permission", permission.as_str())
                            .detail("path", path)
                            .client(client.ip_address.clone(), client.user_agent.clone()),
                    )
                    .await;
            }
            Err(GuardRejection::Forbidden(permission).into())
        }
        Err(other) => Err(other.into()),
    }
}

/// Store the signed-in admin in the session.
///
/// The session id is cycled first so a pre-sign-in id is never reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Clear the session (sign out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, header::USER_AGENT};

    use super::*;

    #[test]
    fn test_client_info_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));

        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.5"));
    }

    #[test]
    fn test_client_info_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.9"));
        assert_eq!(info.user_agent, None);

        assert_eq!(ClientInfo::from_headers(&HeaderMap::new()), ClientInfo::default());
    }
}
