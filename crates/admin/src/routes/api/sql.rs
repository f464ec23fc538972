//! Read-only SQL console proxy.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::Uri,
    routing::post,
};
use serde_json::Value;

use thala_core::GuardChain;
use thala_core::console::{AdmissionError, SqlResponse, admit_query};

use crate::error::AppError;
use crate::middleware::{ClientInfo, OptionalAdminAuth, guarded};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/sql", post(execute))
}

impl From<AdmissionError> for AppError {
    fn from(e: AdmissionError) -> Self {
        match e {
            AdmissionError::Invalid => Self::BadRequest(e.to_string()),
            AdmissionError::NotSelect => Self::Forbidden(e.to_string()),
        }
    }
}

/// The `query` string of a submission body.
///
/// Anything but a JSON object with a string `query` is an invalid query.
fn query_text(body: Result<Json<Value>, JsonRejection>) -> Result<String, AdmissionError> {
    let Ok(Json(body)) = body else {
        return Err(AdmissionError::Invalid);
    };
    match body.get("query") {
        Some(Value::String(query)) => Ok(query.clone()),
        _ => Err(AdmissionError::Invalid),
    }
}

/// POST /api/admin/sql
///
/// # Errors
///
/// 401 without a session; 400 "Invalid query" for a missing, non-string or
/// empty query; 403 for anything that is not a SELECT; otherwise the
/// backend's status and message, defaulting to "Query execution failed".
#[tracing::instrument(skip_all)]
pub async fn execute(
    State(state): State<AppState>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SqlResponse>, AppError> {
    let backend = state.backend();
    guarded(
        &state,
        &GuardChain::authenticated(),
        auth.identity(),
        &client,
        uri.path(),
        |identity| async move {
            let query = query_text(body)?;
            admit_query(&query)?;

            let result = backend
                .execute_sql(&query)
                .await
                .map_err(|e| e.or_message("Query execution failed"))?;

            tracing::info!(
                admin = %identity.email,
                query_len = query.len(),
                row_count = result.row_count,
                "SQL console query executed"
            );
            Ok(Json(result))
        },
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_text_requires_string_query() {
        assert_eq!(
            query_text(Ok(Json(json!({"query": "select 1"})))).unwrap(),
            "select 1"
        );
        assert_eq!(
            query_text(Ok(Json(json!({"query": 42})))),
            Err(AdmissionError::Invalid)
        );
        assert_eq!(
            query_text(Ok(Json(json!({"sql": "select 1"})))),
            Err(AdmissionError::Invalid)
        );
    }

    #[test]
    fn test_admission_errors_map_to_status() {
        assert_eq!(
            AppError::from(AdmissionError::Invalid).status(),
            StatusCode::BAD_REQUEST
        );
        let forbidden = AppError::from(AdmissionError::NotSelect);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            forbidden.to_string(),
            "Only SELECT queries are allowed for security reasons"
        );
    }
}
