//! Base repository trait for database operations.

use crate::db::errors::Result;

/// A repository is the data access layer for one postgres table.
///
/// Separate associated types are used for create requests, update requests, and responses.
/// Table-specific queries (soft deletes, lookups by natural key, bulk fetches) live as inherent
/// methods on each repository.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Update an entity by ID. Fails with [`crate::db::errors::DbError::NotFound`] if it does not exist.
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
