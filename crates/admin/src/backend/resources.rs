//! Per-resource CRUD wrappers.
//!
//! Each backend resource is a marker type implementing [`Resource`]; a
//! [`ResourceApi`] borrowed from the [`BackendClient`] provides the five
//! operations with the resource's payload types.
//!
//! ```rust,ignore
//! let videos = client.resource::<Videos>().get_all().await?;
//! ```

use std::marker::PhantomData;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use thala_core::ResourceKind;

use super::schemas::{
    ArchiveCreate, ArchiveRecord, ArchiveUpdate, CommunityCreate, CommunityRecord,
    CommunityUpdate, EventCreate, EventRecord, EventUpdate, HostRequestCreate, HostRequestRecord,
    HostRequestUpdate, MusicCreate, MusicRecord, MusicUpdate, UserCreate, UserRecord, UserUpdate,
    Validate, VideoCreate, VideoRecord, VideoUpdate,
};
use super::{ApiResult, BackendClient};

/// A backend resource and its payload types.
pub trait Resource: Send + Sync + 'static {
    const KIND: ResourceKind;
    type Record: DeserializeOwned + Serialize + Send;
    type Create: DeserializeOwned + Serialize + Validate + Send + Sync;
    type Update: DeserializeOwned + Serialize + Validate + Send + Sync;

    /// Backend id of a record, as used in item paths and audit entries.
    fn record_id(record: &Self::Record) -> String;
}

macro_rules! resource {
    ($(#[$meta:meta])* $name:ident, $kind:ident, $record:ty, $create:ty, $update:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Resource for $name {
            const KIND: ResourceKind = ResourceKind::$kind;
            type Record = $record;
            type Create = $create;
            type Update = $update;

            fn record_id(record: &Self::Record) -> String {
                record.id.to_string()
            }
        }
    };
}

resource!(
    /// `/users`
    Users, Users, UserRecord, UserCreate, UserUpdate
);
resource!(
    /// `/events`
    Events, Events, EventRecord, EventCreate, EventUpdate
);
resource!(
    /// `/videos`
    Videos, Videos, VideoRecord, VideoCreate, VideoUpdate
);
resource!(
    /// `/music`
    Music, Music, MusicRecord, MusicCreate, MusicUpdate
);
resource!(
    /// `/archive`
    Archive, Archive, ArchiveRecord, ArchiveCreate, ArchiveUpdate
);
resource!(
    /// `/community`
    Community, Community, CommunityRecord, CommunityCreate, CommunityUpdate
);
resource!(
    /// `/community/host-requests`
    HostRequests, HostRequests, HostRequestRecord, HostRequestCreate, HostRequestUpdate
);

/// CRUD operations for resource `R`.
pub struct ResourceApi<'a, R> {
    client: &'a BackendClient,
    _resource: PhantomData<R>,
}

impl BackendClient {
    /// Operations for resource `R`.
    #[must_use]
    pub const fn resource<R: Resource>(&self) -> ResourceApi<'_, R> {
        ResourceApi {
            client: self,
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceApi<'_, R> {
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[tracing::instrument(skip(self), fields(resource = %R::KIND))]
    pub async fn get_all(&self) -> ApiResult<Vec<R::Record>> {
        self.client
            .request::<_, ()>(Method::GET, R::KIND.backend_path(), None)
            .await
    }

    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[tracing::instrument(skip(self), fields(resource = %R::KIND))]
    pub async fn get_by_id(&self, id: &str) -> ApiResult<R::Record> {
        let url = self.client.api_item(R::KIND.backend_path(), id)?;
        let response = self.client.send::<()>(Method::GET, url, None).await?;
        BackendClient::handle_response(response).await
    }

    /// # Errors
    ///
    /// Returns `GatewayError::Invalid` without calling the backend if the
    /// payload fails validation, or another `GatewayError` if the call fails.
    #[tracing::instrument(skip_all, fields(resource = %R::KIND))]
    pub async fn create(&self, payload: &R::Create) -> ApiResult<R::Record> {
        payload.validate()?;
        self.client
            .request(Method::POST, R::KIND.backend_path(), Some(payload))
            .await
    }

    /// # Errors
    ///
    /// Returns `GatewayError::Invalid` without calling the backend if the
    /// payload fails validation, or another `GatewayError` if the call fails.
    #[tracing::instrument(skip(self, payload), fields(resource = %R::KIND))]
    pub async fn update(&self, id: &str, payload: &R::Update) -> ApiResult<R::Record> {
        payload.validate()?;
        let url = self.client.api_item(R::KIND.backend_path(), id)?;
        let response = self.client.send(Method::PUT, url, Some(payload)).await?;
        BackendClient::handle_response(response).await
    }

    /// Delete a record. Any 2xx response counts as success; the body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[tracing::instrument(skip(self), fields(resource = %R::KIND))]
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let url = self.client.api_item(R::KIND.backend_path(), id)?;
        self.client.send::<()>(Method::DELETE, url, None).await?;
        Ok(())
    }
}
