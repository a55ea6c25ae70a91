//! Database repository for threads.
//!
//! Rows are soft-deleted: `deleted_at` is set and the row is hidden from every read except
//! [`Threads::find_by_external_id`], which create uses to restore a previously deleted thread.

use std::collections::HashMap;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::threads::{ThreadCreateDBRequest, ThreadDBResponse, ThreadFilter, ThreadUpdateDBRequest},
    },
    types::{ThreadId, UserId},
};
use sqlx::PgConnection;
use tracing::instrument;

const THREAD_COLUMNS: &str = "id, user_id, thread_id, is_e, is_c, is_s, brand, thread_count, created_at, updated_at, deleted_at";

pub struct Threads<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Threads<'c> {
    type CreateRequest = ThreadCreateDBRequest;
    type UpdateRequest = ThreadUpdateDBRequest;
    type Response = ThreadDBResponse;
    type Id = ThreadId;

    #[instrument(skip(self, request), fields(user_id = request.user_id, thread_id = %request.thread_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            r#"
            INSERT INTO threads (user_id, thread_id, is_e, is_c, is_s, brand, thread_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {THREAD_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(&request.thread_id)
        .bind(request.is_e)
        .bind(request.is_c)
        .bind(request.is_s)
        .bind(&request.brand)
        .bind(request.thread_count)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(thread)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(thread)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            r#"
            UPDATE threads SET
                thread_id = COALESCE($2, thread_id),
                is_e = COALESCE($3, is_e),
                is_c = COALESCE($4, is_c),
                is_s = COALESCE($5, is_s),
                brand = COALESCE($6, brand),
                thread_count = COALESCE($7, thread_count),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {THREAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.thread_id)
        .bind(request.is_e)
        .bind(request.is_c)
        .bind(request.is_s)
        .bind(&request.brand)
        .bind(request.thread_count)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(thread)
    }
}

impl<'c> Threads<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Live threads matching the filter, oldest first
    #[instrument(skip(self, filter), fields(user_id = filter.user_id, brand = ?filter.brand), err)]
    pub async fn list(&mut self, filter: &ThreadFilter) -> Result<Vec<ThreadDBResponse>> {
        let threads = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            r#"
            SELECT {THREAD_COLUMNS} FROM threads
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::TEXT IS NULL OR brand = $2)
            ORDER BY id
            "#
        ))
        .bind(filter.user_id)
        .bind(&filter.brand)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(threads)
    }

    /// Fetch live threads by id and lock them until the surrounding transaction ends.
    /// Missing or soft-deleted ids are absent from the map.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn get_bulk_for_update(&mut self, ids: &[ThreadId]) -> Result<HashMap<ThreadId, ThreadDBResponse>> {
        let threads = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE id = ANY($1) AND deleted_at IS NULL ORDER BY id FOR UPDATE"
        ))
        .bind(ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(threads.into_iter().map(|t| (t.id, t)).collect())
    }

    /// Look up an owner's thread by its external id, including soft-deleted rows, and lock it
    #[instrument(skip(self), err)]
    pub async fn find_by_external_id(&mut self, user_id: UserId, thread_id: &str) -> Result<Option<ThreadDBResponse>> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE user_id = $1 AND thread_id = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(thread_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(thread)
    }

    /// Bring a soft-deleted row back with fresh field values. The row keeps its id.
    #[instrument(skip(self, request), err)]
    pub async fn restore(&mut self, id: ThreadId, request: &ThreadCreateDBRequest) -> Result<ThreadDBResponse> {
        let thread = sqlx::query_as::<_, ThreadDBResponse>(&format!(
            r#"
            UPDATE threads SET
                is_e = $2,
                is_c = $3,
                is_s = $4,
                brand = $5,
                thread_count = $6,
                deleted_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {THREAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.is_e)
        .bind(request.is_c)
        .bind(request.is_s)
        .bind(&request.brand)
        .bind(request.thread_count)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(thread)
    }

    /// Soft delete. Returns false if the thread was missing or already deleted.
    #[instrument(skip(self), err)]
    pub async fn soft_delete(&mut self, id: ThreadId) -> Result<bool> {
        let result = sqlx::query("UPDATE threads SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    fn create_request(user_id: UserId, thread_id: &str, brand: &str) -> ThreadCreateDBRequest {
        ThreadCreateDBRequest {
            user_id,
            thread_id: thread_id.to_string(),
            is_e: false,
            is_c: true,
            is_s: false,
            brand: brand.to_string(),
            thread_count: 10,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get(pool: PgPool) {
        let (user, _) = create_test_user(&pool, "threadowner").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Threads::new(&mut conn);

        let created = repo.create(&create_request(user.id, "T-100", "acme")).await.unwrap();
        assert_eq!(created.user_id, user.id);
        assert_eq!(created.thread_id, "T-100");
        assert!(created.is_c);
        assert!(!created.is_deleted());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.thread_count, 10);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_keeps_unset_fields(pool: PgPool) {
        let (user, _) = create_test_user(&pool, "partial").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Threads::new(&mut conn);

        let created = repo.create(&create_request(user.id, "T-1", "acme")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &ThreadUpdateDBRequest {
                    thread_count: Some(42),
                    is_e: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.thread_count, 42);
        assert!(updated.is_e);
        assert!(updated.is_c);
        assert_eq!(updated.brand, "acme");
        assert_eq!(updated.thread_id, "T-1");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_soft_delete_hides_row(pool: PgPool) {
        let (user, _) = create_test_user(&pool, "softdelete").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Threads::new(&mut conn);

        let created = repo.create(&create_request(user.id, "T-1", "acme")).await.unwrap();
        assert!(repo.soft_delete(created.id).await.unwrap());
        assert!(!repo.soft_delete(created.id).await.unwrap());

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(repo.list(&ThreadFilter::for_owner(user.id)).await.unwrap().is_empty());

        let err = repo.update(created.id, &ThreadUpdateDBRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        let hidden = repo.find_by_external_id(user.id, "T-1").await.unwrap().unwrap();
        assert!(hidden.is_deleted());

        let restored = repo.restore(hidden.id, &create_request(user.id, "T-1", "other")).await.unwrap();
        assert_eq!(restored.id, created.id);
        assert_eq!(restored.brand, "other");
        assert!(!restored.is_deleted());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_owner_and_brand(pool: PgPool) {
        let (alice, _) = create_test_user(&pool, "alice").await;
        let (bob, _) = create_test_user(&pool, "bob").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Threads::new(&mut conn);

        repo.create(&create_request(alice.id, "A-1", "acme")).await.unwrap();
        repo.create(&create_request(alice.id, "A-2", "globex")).await.unwrap();
        repo.create(&create_request(bob.id, "A-1", "acme")).await.unwrap();

        let all = repo.list(&ThreadFilter::for_owner(alice.id)).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.user_id == alice.id));

        let acme = repo.list(&ThreadFilter::for_owner(alice.id).with_brand("acme")).await.unwrap();
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].thread_id, "A-1");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_external_id_per_owner_rejected(pool: PgPool) {
        let (user, _) = create_test_user(&pool, "dupes").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Threads::new(&mut conn);

        repo.create(&create_request(user.id, "T-1", "acme")).await.unwrap();
        let err = repo.create(&create_request(user.id, "T-1", "acme")).await.unwrap_err();
        assert!(err.is_unique_violation_on("threads_user_id_thread_id_key"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_bulk_skips_missing_and_deleted(pool: PgPool) {
        let (user, _) = create_test_user(&pool, "bulk").await;
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Threads::new(&mut tx);

        let a = repo.create(&create_request(user.id, "T-1", "acme")).await.unwrap();
        let b = repo.create(&create_request(user.id, "T-2", "acme")).await.unwrap();
        repo.soft_delete(b.id).await.unwrap();

        let found = repo.get_bulk_for_update(&[a.id, b.id, b.id + 1000]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&a.id));
    }
}
