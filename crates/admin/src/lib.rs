//! Thala admin library.
//!
//! This crate provides the admin dashboard service as a library, allowing
//! it to be tested and reused.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE access:
//! - Backend resource CRUD and moderation
//! - Read-only SQL against the production database
//! - The audit log
//!
//! Deploy only behind the identity-aware proxy that forwards the admin's
//! email; the service trusts that header on `/auth/signin`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use config::ConfigError;
use state::AppState;

/// Build the application router: routes, sessions and request tracing.
///
/// Sentry layers are added by the binary, outside this router.
///
/// # Errors
///
/// Returns `ConfigError` if the session signing key cannot be derived.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let router = middleware::with_session_layer(routes::routes(), state.config())?;

    Ok(router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state))
}
