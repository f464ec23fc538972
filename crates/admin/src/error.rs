//! Unified error handling for admin.
//!
//! Every route returns `Result<_, AppError>`; the error is rendered as a JSON
//! body `{"error": "<message>"}` with a status taken from the taxonomy below.
//!
//! | Variant | Status |
//! |---------|--------|
//! | `Unauthorized` | 401 |
//! | `Forbidden` | 403 |
//! | `BadRequest`, `Validation`, `Gateway(Invalid)` | 400 |
//! | `NotFound` | 404 |
//! | `Gateway(Status)` | relayed from upstream |
//! | everything else | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use thala_core::{GuardError, GuardRejection};

use crate::audit::AuditError;
use crate::backend::{GatewayError, ValidationError};

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Payload failed schema validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Backend call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Audit store failed.
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::Gateway(GatewayError::Invalid(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gateway(GatewayError::Status { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Gateway(_) | Self::Audit(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the JSON body.
    fn client_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Invalid(e)) => format!("Validation failed: {e}"),
            Self::Gateway(e @ GatewayError::Status { .. }) => e.client_message(),
            Self::Audit(_) | Self::Session(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<GuardRejection> for AppError {
    fn from(rejection: GuardRejection) -> Self {
        match rejection {
            GuardRejection::Unauthenticated => Self::Unauthorized,
            GuardRejection::Forbidden(_) => Self::Forbidden(rejection.to_string()),
        }
    }
}

impl From<GuardError<Self>> for AppError {
    fn from(error: GuardError<Self>) -> Self {
        match error {
            GuardError::Rejected(rejection) => rejection.into(),
            GuardError::Handler(inner) => inner,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(email: &str, name: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            username: name.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use thala_core::AdminPermission;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            AppError::BadRequest("Invalid query".to_string()).to_string(),
            "Invalid query"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("no".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Gateway(GatewayError::Status {
                status: 422,
                message: Some("bad column".to_string())
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Gateway(GatewayError::Decode("eof".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_guard_rejections_render_json() {
        let (status, body) = body_of(GuardRejection::Unauthenticated.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, body) =
            body_of(GuardRejection::Forbidden(AdminPermission::ViewAuditLogs).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden: Insufficient permissions");
    }

    #[tokio::test]
    async fn test_upstream_message_is_relayed() {
        let (status, body) = body_of(AppError::Gateway(GatewayError::Status {
            status: 400,
            message: Some("column \"nope\" does not exist".to_string()),
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "column \"nope\" does not exist");
    }

    #[tokio::test]
    async fn test_invalid_payload_is_bad_request() {
        let err = AppError::Gateway(GatewayError::Invalid(ValidationError::Empty("title")));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Validation failed"));
    }

    #[tokio::test]
    async fn test_handler_error_passes_through_guard() {
        let err: AppError = GuardError::Handler(AppError::NotFound("gone".to_string())).into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "gone");
    }
}
