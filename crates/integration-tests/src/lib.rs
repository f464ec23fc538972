//! Integration test harness for Thala admin.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p thala-integration-tests
//! ```
//!
//! Each test builds the full admin router in process and points its
//! backend gateway at a [`StubBackend`] listening on an ephemeral port.
//! Requests are driven through `tower::ServiceExt::oneshot`; the session
//! cookie returned by sign-in is replayed by hand.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Method, Request, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use thala_admin::audit::AuditLog;
use thala_admin::config::{AdminConfig, DEFAULT_IDENTITY_HEADER, DEFAULT_IDENTITY_NAME_HEADER};
use thala_admin::state::AppState;
use thala_core::{AdminDirectory, AdminEntry, AdminRole, AuditLogEntry, Email};

pub const SUPER_ADMIN: &str = "super@thala.app";
pub const MODERATOR: &str = "mod@thala.app";
pub const VIEWER: &str = "viewer@thala.app";

const SESSION_SECRET: &str =
    "q8Zr2vN7kLw4Tb9Xe1Jc6Hs3Mf5Gd0Ya8Up2Ri7Ok4Wn1Qt6Vz3Bx9Cm5Ej0Fl2Dh8Sg4Ai7Pu1Ko3Ly6";

/// Backend requests seen by the stub, as `"METHOD /path"`.
pub type RequestLog = Arc<Mutex<Vec<String>>>;

/// Minimal stand-in for the Thala backend.
pub struct StubBackend {
    pub addr: SocketAddr,
    pub requests: RequestLog,
    stats_failing: Arc<AtomicBool>,
}

impl StubBackend {
    pub async fn spawn() -> Self {
        let requests = RequestLog::default();
        let stats_failing = Arc::new(AtomicBool::new(false));
        let router = Router::new()
            .route(
                "/api/v1/admin/stats",
                get(stats).with_state(stats_failing.clone()),
            )
            .route("/api/v1/admin/sql", post(sql))
            .route("/api/v1/videos/{id}", put(echo_item).delete(echo_item))
            .route("/api/v1/music", get(music_list).post(music_create))
            .layer(axum::middleware::from_fn_with_state(requests.clone(), log_request))
            .with_state(requests.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            requests,
            stats_failing,
        }
    }

    /// Make `/api/v1/admin/stats` answer 503 with only a `detail` field.
    pub fn fail_stats(&self) {
        self.stats_failing.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Everything the stub has been asked so far.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn log_request(
    State(requests): State<RequestLog>,
    request: Request<Body>,
    next: axum::middleware::Next,
) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    requests.lock().unwrap().push(line);
    next.run(request).await
}

async fn stats(State(fail): State<Arc<AtomicBool>>) -> Response {
    if fail.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"detail": "stats cache rebuilding"})),
        )
            .into_response();
    }
    Json(json!({
        "total_users": 42,
        "total_events": 3,
        "total_videos": 17,
        "total_likes": 900
    }))
    .into_response()
}

async fn sql(Json(body): Json<Value>) -> Response {
    let query = body["query"].as_str().unwrap_or_default();
    if query.contains("boom") {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "syntax error"}))).into_response();
    }
    Json(json!({
        "columns": ["region", "total"],
        "rows": [{"region": "Souss", "total": 12}, {"region": "Rif", "total": 5}]
    }))
    .into_response()
}

async fn echo_item(Path(id): Path<String>) -> Json<Value> {
    Json(json!({"id": id}))
}

async fn music_list() -> Json<Value> {
    Json(json!([
        {"id": 1, "title": "Izlan", "artist": "Raissa"},
        {"id": 2, "title": "Ahwach", "artist": "Tinariwen", "genre": "desert"}
    ]))
}

async fn music_create(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut record = body;
    record["id"] = json!(7);
    (StatusCode::CREATED, record.into())
}

/// Admin configuration pointing at `backend_url`.
#[must_use]
pub fn test_config(backend_url: &str) -> AdminConfig {
    AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        users_file: PathBuf::from("admins.yaml"),
        api_url: format!("{backend_url}/api/v1"),
        backend_url: backend_url.to_string(),
        identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
        identity_name_header: DEFAULT_IDENTITY_NAME_HEADER.to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// One admin per interesting role.
#[must_use]
pub fn test_directory() -> AdminDirectory {
    let entry = |email: &str, name: &str, role| AdminEntry {
        email: Email::parse(email).unwrap(),
        name: name.to_string(),
        role,
    };
    AdminDirectory::new([
        entry(SUPER_ADMIN, "Super", AdminRole::SuperAdmin),
        entry(MODERATOR, "Mod", AdminRole::Moderator),
        entry(VIEWER, "Viewer", AdminRole::Viewer),
    ])
    .unwrap()
}

/// The admin app wired to a fresh stub backend.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: StubBackend,
}

/// A response with its body already collected.
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let backend = StubBackend::spawn().await;
        let config = test_config(&backend.url());
        let state = AppState::new(config, test_directory(), AuditLog::in_memory()).unwrap();
        let router = thala_admin::app(state.clone()).unwrap();
        Self {
            router,
            state,
            backend,
        }
    }

    /// Send one request; `cookie` is a `name=value` pair from [`Self::signin`].
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri.parse::<Uri>().unwrap());
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(String::from);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// Sign in through the proxy header, returning the raw sign-in response.
    pub async fn signin_as(&self, email: &str) -> TestResponse {
        let request = Request::builder()
            .uri("/auth/signin")
            .header(DEFAULT_IDENTITY_HEADER, email)
            .header(DEFAULT_IDENTITY_NAME_HEADER, "Test Admin")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header(header::USER_AGENT, "integration-tests")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Sign in and return the session cookie.
    pub async fn signin(&self, email: &str) -> String {
        let response = self.signin_as(email).await;
        assert_eq!(response.status, StatusCode::OK, "signin failed: {}", response.body);
        response.set_cookie.expect("signin sets a session cookie")
    }

    /// Audit entries, newest first.
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.audit().recent(usize::MAX).await.unwrap()
    }

    /// Backend requests seen by the stub so far.
    #[must_use]
    pub fn backend_requests(&self) -> Vec<String> {
        self.backend.seen()
    }
}
