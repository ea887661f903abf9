// ── Remote data source ──
//
// Each resource type supplies only its network functions; the generic
// mutator and coordinator do the rest.

use std::marker::PhantomData;

use async_trait::async_trait;
use folio_api::RestClient;

use crate::error::CoreError;
use crate::model::{Resource, ResourceId};

/// The four network operations behind a resource table.
#[async_trait]
pub trait RemoteSource<T: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, CoreError>;

    async fn create(&self, draft: &T::Draft) -> Result<T, CoreError>;

    async fn update(&self, id: &ResourceId, patch: &T::Patch) -> Result<T, CoreError>;

    async fn delete(&self, id: &ResourceId) -> Result<(), CoreError>;
}

/// `RemoteSource` over the REST surface, one table per resource type.
pub struct HttpRemote<T> {
    client: RestClient,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> HttpRemote<T> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Resource> RemoteSource<T> for HttpRemote<T> {
    async fn list(&self) -> Result<Vec<T>, CoreError> {
        Ok(self.client.list(T::KIND.table()).await?)
    }

    async fn create(&self, draft: &T::Draft) -> Result<T, CoreError> {
        Ok(self.client.create(T::KIND.table(), draft).await?)
    }

    async fn update(&self, id: &ResourceId, patch: &T::Patch) -> Result<T, CoreError> {
        Ok(self
            .client
            .update(T::KIND.table(), &id.to_string(), patch)
            .await?)
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), CoreError> {
        Ok(self.client.delete(T::KIND.table(), &id.to_string()).await?)
    }
}
