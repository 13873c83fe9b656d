//! Catalog calls (categories, courses) through the authenticated transport.

use tracing::{debug, instrument};

use coursedesk_core::{ListPayload, Resource, Result};

use crate::client::ApiClient;

impl ApiClient {
    /// List a collection. Accepts both bare-array and paginated replies.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn list<T: Resource>(&self) -> Result<Vec<T>> {
        let payload: ListPayload<T> = self.get(T::COLLECTION).await?;
        if let Some(next) = payload.next_page() {
            debug!(next, "Server paginated the listing; returning the first page");
        }
        Ok(payload.into_items())
    }

    /// Fetch one item by id.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn fetch<T: Resource>(&self, id: u64) -> Result<T> {
        self.get(&T::detail_path(id)).await
    }

    /// Create an item from its draft.
    #[instrument(skip(self, draft), fields(collection = T::COLLECTION))]
    pub async fn create<T: Resource>(&self, draft: &T::Draft) -> Result<T> {
        self.post(T::COLLECTION, draft).await
    }

    /// Replace an item with a draft.
    #[instrument(skip(self, draft), fields(collection = T::COLLECTION))]
    pub async fn update<T: Resource>(&self, id: u64, draft: &T::Draft) -> Result<T> {
        self.put(&T::detail_path(id), draft).await
    }

    /// Delete an item by id.
    #[instrument(skip(self), fields(collection = T::COLLECTION))]
    pub async fn remove<T: Resource>(&self, id: u64) -> Result<()> {
        self.delete(&T::detail_path(id)).await
    }
}
