//! Ownership-scoped thread operations.
//!
//! Every read and write checks that the caller owns the row. Missing rows are reported before
//! ownership, so a caller learns "not found" for ids that do not exist and "not authorized" for
//! ids owned by someone else. Batch operations lock all their rows up front and either apply
//! every change or none.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::threads::{ThreadBulkUpdate, ThreadCreate, ThreadUpdate},
    db::{
        handlers::{Repository, Threads},
        models::threads::{ThreadCreateDBRequest, ThreadDBResponse, ThreadFilter, ThreadUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, ThreadId, UserId},
};

fn not_found(id: ThreadId) -> Error {
    Error::NotFound {
        resource: "Thread".to_string(),
        id: id.to_string(),
    }
}

fn ensure_owner(thread: &ThreadDBResponse, owner: UserId, action: Operation) -> Result<()> {
    if thread.user_id != owner {
        return Err(Error::InsufficientPermissions {
            action,
            resource: "thread".to_string(),
        });
    }
    Ok(())
}

/// Lock the given live threads and check each, in request order, exists and belongs to `owner`.
/// The first failing id decides the error.
async fn lock_owned(
    conn: &mut PgConnection,
    owner: UserId,
    ids: &[ThreadId],
    action: Operation,
) -> Result<HashMap<ThreadId, ThreadDBResponse>> {
    let threads = Threads::new(conn).get_bulk_for_update(ids).await?;

    for id in ids {
        let thread = threads.get(id).ok_or_else(|| not_found(*id))?;
        ensure_owner(thread, owner, action)?;
    }

    Ok(threads)
}

pub struct ThreadService<'a> {
    db: &'a PgPool,
}

impl<'a> From<&'a AppState> for ThreadService<'a> {
    fn from(state: &'a AppState) -> Self {
        Self::new(&state.db)
    }
}

impl<'a> ThreadService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    /// Create a thread, or bring back the owner's soft-deleted thread with the same external id
    #[instrument(skip(self, request), fields(thread_id = %request.thread_id), err)]
    pub async fn create(&self, owner: UserId, request: ThreadCreate) -> Result<ThreadDBResponse> {
        let thread_id = request.thread_id.trim();
        if thread_id.is_empty() {
            return Err(Error::bad_request("thread_id is required"));
        }

        let db_request = ThreadCreateDBRequest {
            user_id: owner,
            thread_id: thread_id.to_string(),
            is_e: request.is_e,
            is_c: request.is_c,
            is_s: request.is_s,
            brand: request.brand,
            thread_count: request.thread_count,
        };

        let mut tx = self.db.begin().await?;
        let mut threads = Threads::new(&mut tx);

        let thread = match threads.find_by_external_id(owner, &db_request.thread_id).await? {
            Some(existing) if existing.is_deleted() => {
                let restored = threads.restore(existing.id, &db_request).await?;
                info!(id = restored.id, "Thread restored");
                restored
            }
            Some(_) => {
                return Err(Error::Conflict {
                    message: "A thread with this thread_id already exists".to_string(),
                });
            }
            None => {
                let created = threads.create(&db_request).await?;
                info!(id = created.id, "Thread created");
                created
            }
        };

        tx.commit().await?;
        Ok(thread)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, owner: UserId, id: ThreadId) -> Result<ThreadDBResponse> {
        let mut conn = self.db.acquire().await?;
        let thread = Threads::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;

        ensure_owner(&thread, owner, Operation::Read)?;
        Ok(thread)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&self, owner: UserId, brand: Option<String>) -> Result<Vec<ThreadDBResponse>> {
        let mut filter = ThreadFilter::for_owner(owner);
        if let Some(brand) = brand {
            filter = filter.with_brand(brand);
        }

        let mut conn = self.db.acquire().await?;
        Ok(Threads::new(&mut conn).list(&filter).await?)
    }

    #[instrument(skip(self, changes), err)]
    pub async fn update(&self, owner: UserId, id: ThreadId, changes: ThreadUpdate) -> Result<ThreadDBResponse> {
        let mut updated = self.update_many(owner, vec![ThreadBulkUpdate { id, changes }]).await?;
        updated.pop().ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, owner: UserId, id: ThreadId) -> Result<()> {
        self.delete_many(owner, &[id]).await
    }

    /// Apply every update or none. Results are in request order.
    #[instrument(skip(self, items), fields(count = items.len()), err)]
    pub async fn update_many(&self, owner: UserId, mut items: Vec<ThreadBulkUpdate>) -> Result<Vec<ThreadDBResponse>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        // Same normalization as create, so padded ids cannot slip past the uniqueness index
        for item in &mut items {
            if let Some(thread_id) = item.changes.thread_id.as_mut() {
                let trimmed = thread_id.trim();
                if trimmed.is_empty() {
                    return Err(Error::bad_request("thread_id cannot be empty"));
                }
                *thread_id = trimmed.to_string();
            }
        }

        let ids: Vec<ThreadId> = items.iter().map(|item| item.id).collect();

        let mut tx = self.db.begin().await?;
        lock_owned(&mut tx, owner, &ids, Operation::Update).await?;

        let mut threads = Threads::new(&mut tx);
        let mut updated = Vec::with_capacity(items.len());
        for item in items {
            updated.push(threads.update(item.id, &ThreadUpdateDBRequest::from(item.changes)).await?);
        }

        tx.commit().await?;
        info!(count = updated.len(), "Threads updated");
        Ok(updated)
    }

    /// Soft delete every listed thread or none. Repeated ids count once.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn delete_many(&self, owner: UserId, ids: &[ThreadId]) -> Result<()> {
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        lock_owned(&mut tx, owner, &unique, Operation::Delete).await?;

        let mut threads = Threads::new(&mut tx);
        for id in &unique {
            threads.soft_delete(*id).await?;
        }

        tx.commit().await?;
        info!(count = unique.len(), "Threads deleted");
        Ok(())
    }
}
