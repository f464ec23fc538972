//! Typed CRUD passthrough for the backend resources.
//!
//! `/api/admin/{resource}` where `{resource}` is one of the
//! [`ResourceKind`] segments. Payloads are decoded into the resource's
//! create/update type and validated before anything reaches the backend.
//! Mutations are audited.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use thala_core::{AdminPermission, GuardChain, Identity, Mutation, NewAuditEntry, ResourceKind};

use crate::backend::{
    Archive, BackendClient, Community, Events, HostRequests, Music, Resource, Users, Videos,
};
use crate::error::AppError;
use crate::middleware::{ClientInfo, OptionalAdminAuth, guarded};
use crate::state::AppState;

/// Run `$body` with `$r` bound to the marker type of `$kind`.
macro_rules! with_resource {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResourceKind::Users => {
                type $r = Users;
                $body
            }
            ResourceKind::Events => {
                type $r = Events;
                $body
            }
            ResourceKind::Videos => {
                type $r = Videos;
                $body
            }
            ResourceKind::Music => {
                type $r = Music;
                $body
            }
            ResourceKind::Archive => {
                type $r = Archive;
                $body
            }
            ResourceKind::Community => {
                type $r = Community;
                $body
            }
            ResourceKind::HostRequests => {
                type $r = HostRequests;
                $body
            }
        }
    };
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/{resource}", get(list).post(create))
        .route(
            "/api/admin/{resource}/{id}",
            get(show).put(update).delete(remove),
        )
}

/// Response for a delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

fn parse_kind(segment: &str) -> Result<ResourceKind, AppError> {
    segment
        .parse()
        .map_err(|_| AppError::NotFound("Unknown resource".to_string()))
}

fn decode<T: DeserializeOwned>(
    kind: ResourceKind,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) =
        body.map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid {kind} payload: {e}")))
}

/// Everything a guarded resource handler needs besides the payload.
struct Call<'a> {
    state: &'a AppState,
    client: &'a ClientInfo,
    kind: ResourceKind,
}

impl Call<'_> {
    fn backend(&self) -> &BackendClient {
        self.state.backend()
    }

    async fn audit(&self, identity: Identity, mutation: Mutation, id: String) {
        self.state
            .audit()
            .record(
                NewAuditEntry::new(self.kind.audit_action(mutation), identity.email)
                    .admin_name(identity.name)
                    .resource(self.kind.audit_type(), id)
                    .client(self.client.ip_address.clone(), self.client.user_agent.clone()),
            )
            .await;
    }
}

async fn run_guarded<F, Fut>(
    state: &AppState,
    auth: &OptionalAdminAuth,
    client: &ClientInfo,
    uri: &Uri,
    permission: AdminPermission,
    handler: F,
) -> Result<Response, AppError>
where
    F: FnOnce(Identity) -> Fut,
    Fut: Future<Output = Result<Response, AppError>>,
{
    guarded(
        state,
        &GuardChain::authenticated().require(permission),
        auth.identity(),
        client,
        uri.path(),
        handler,
    )
    .await
}

async fn list_records<R: Resource>(call: &Call<'_>) -> Result<Response, AppError> {
    let records = call.backend().resource::<R>().get_all().await?;
    Ok(Json(records).into_response())
}

async fn show_record<R: Resource>(call: &Call<'_>, id: &str) -> Result<Response, AppError> {
    let record = call.backend().resource::<R>().get_by_id(id).await?;
    Ok(Json(record).into_response())
}

async fn create_record<R: Resource>(
    call: &Call<'_>,
    identity: Identity,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload: R::Create = decode(call.kind, body)?;
    let record = call.backend().resource::<R>().create(&payload).await?;
    call.audit(identity, Mutation::Create, R::record_id(&record))
        .await;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn update_record<R: Resource>(
    call: &Call<'_>,
    identity: Identity,
    id: String,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload: R::Update = decode(call.kind, body)?;
    let record = call.backend().resource::<R>().update(&id, &payload).await?;
    call.audit(identity, Mutation::Update, id).await;
    Ok(Json(record).into_response())
}

async fn delete_record<R: Resource>(
    call: &Call<'_>,
    identity: Identity,
    id: String,
) -> Result<Response, AppError> {
    call.backend().resource::<R>().delete(&id).await?;
    call.audit(identity, Mutation::Delete, id).await;
    Ok(Json(DeleteResponse { success: true }).into_response())
}

/// GET /api/admin/{resource}
#[tracing::instrument(skip_all, fields(resource = %resource))]
pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
) -> Result<Response, AppError> {
    let kind = parse_kind(&resource)?;
    let call = Call {
        state: &state,
        client: &client,
        kind,
    };
    run_guarded(&state, &auth, &client, &uri, kind.view_permission(), |_| async {
        with_resource!(kind, R => list_records::<R>(&call).await)
    })
    .await
}

/// GET /api/admin/{resource}/{id}
#[tracing::instrument(skip_all, fields(resource = %resource, id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
) -> Result<Response, AppError> {
    let kind = parse_kind(&resource)?;
    let call = Call {
        state: &state,
        client: &client,
        kind,
    };
    run_guarded(&state, &auth, &client, &uri, kind.view_permission(), |_| async {
        with_resource!(kind, R => show_record::<R>(&call, &id).await)
    })
    .await
}

/// POST /api/admin/{resource}
#[tracing::instrument(skip_all, fields(resource = %resource))]
pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&resource)?;
    let call = Call {
        state: &state,
        client: &client,
        kind,
    };
    let permission = kind.mutation_permission(Mutation::Create);
    run_guarded(&state, &auth, &client, &uri, permission, |identity| async {
        with_resource!(kind, R => create_record::<R>(&call, identity, body).await)
    })
    .await
}

/// PUT /api/admin/{resource}/{id}
#[tracing::instrument(skip_all, fields(resource = %resource, id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&resource)?;
    let call = Call {
        state: &state,
        client: &client,
        kind,
    };
    let permission = kind.mutation_permission(Mutation::Update);
    run_guarded(&state, &auth, &client, &uri, permission, |identity| async {
        with_resource!(kind, R => update_record::<R>(&call, identity, id, body).await)
    })
    .await
}

/// DELETE /api/admin/{resource}/{id}
#[tracing::instrument(skip_all, fields(resource = %resource, id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    auth: OptionalAdminAuth,
    client: ClientInfo,
    uri: Uri,
) -> Result<Response, AppError> {
    let kind = parse_kind(&resource)?;
    let call = Call {
        state: &state,
        client: &client,
        kind,
    };
    let permission = kind.mutation_permission(Mutation::Delete);
    run_guarded(&state, &auth, &client, &uri, permission, |identity| async {
        with_resource!(kind, R => delete_record::<R>(&call, identity, id).await)
    })
    .await
}
