//! Sign-in, sign-out and session gating.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};

use thala_core::AuditAction;
use thala_integration_tests::{MODERATOR, SUPER_ADMIN, TestApp, VIEWER};

#[tokio::test]
async fn test_health_needs_no_session() {
    let app = TestApp::spawn().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_signin_without_identity_header_is_unauthorized() {
    let app = TestApp::spawn().await;
    let response = app.request(Method::GET, "/auth/signin", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.audit_entries().await.is_empty());
}

#[tokio::test]
async fn test_non_admin_signin_is_refused_and_audited() {
    let app = TestApp::spawn().await;
    let response = app.signin_as("stranger@example.org").await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Access denied");
    assert!(response.set_cookie.is_none());

    let entries = app.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action(), AuditAction::UnauthorizedAccess);
    assert_eq!(entries[0].admin_email(), "stranger@example.org");
    assert_eq!(entries[0].entry.ip_address.as_deref(), Some("203.0.113.9"));
}

#[tokio::test]
async fn test_signin_establishes_session() {
    let app = TestApp::spawn().await;
    let response = app.signin_as(MODERATOR).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["role"], "moderator");
    let cookie = response.set_cookie.unwrap();
    assert!(cookie.starts_with("thala_admin_session="));

    let me = app
        .request(Method::GET, "/api/admin/me", Some(&cookie), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], MODERATOR);
    assert_eq!(me.body["role"], "moderator");
    let permissions = me.body["permissions"].as_array().unwrap();
    assert!(permissions.iter().any(|p| p == "delete_videos"));
    assert!(!permissions.iter().any(|p| p == "delete_users"));

    let entries = app.audit_entries().await;
    assert_eq!(entries[0].action(), AuditAction::Login);
    assert_eq!(entries[0].entry.user_agent.as_deref(), Some("integration-tests"));
}

#[tokio::test]
async fn test_me_without_session_is_unauthorized() {
    let app = TestApp::spawn().await;
    let response = app.request(Method::GET, "/api/admin/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let forged = app
        .request(
            Method::GET,
            "/api/admin/me",
            Some("thala_admin_session=not-a-real-session"),
            None,
        )
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signout_ends_session() {
    let app = TestApp::spawn().await;
    let cookie = app.signin(VIEWER).await;

    let response = app
        .request(Method::POST, "/auth/signout", Some(&cookie), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);

    let me = app
        .request(Method::GET, "/api/admin/me", Some(&cookie), None)
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let entries = app.audit_entries().await;
    assert_eq!(entries[0].action(), AuditAction::Logout);
    assert_eq!(entries[0].admin_email(), VIEWER);
}

#[tokio::test]
async fn test_signout_without_session_is_harmless() {
    let app = TestApp::spawn().await;
    let response = app.request(Method::POST, "/auth/signout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(app.audit_entries().await.is_empty());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let app = TestApp::spawn().await;
    let first = app.signin(SUPER_ADMIN).await;
    let second = app.signin(VIEWER).await;
    assert_ne!(first, second);

    let me = app
        .request(Method::GET, "/api/admin/me", Some(&first), None)
        .await;
    assert_eq!(me.body["role"], "super_admin");
    let me = app
        .request(Method::GET, "/api/admin/me", Some(&second), None)
        .await;
    assert_eq!(me.body["role"], "viewer");
}
