//! Database models for threads.

use crate::types::{ThreadId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating (or restoring) a thread
#[derive(Debug, Clone)]
pub struct ThreadCreateDBRequest {
    pub user_id: UserId,
    pub thread_id: String,
    pub is_e: bool,
    pub is_c: bool,
    pub is_s: bool,
    pub brand: String,
    pub thread_count: i64,
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ThreadUpdateDBRequest {
    pub thread_id: Option<String>,
    pub is_e: Option<bool>,
    pub is_c: Option<bool>,
    pub is_s: Option<bool>,
    pub brand: Option<String>,
    pub thread_count: Option<i64>,
}

/// Filter for listing live threads
#[derive(Debug, Clone)]
pub struct ThreadFilter {
    pub user_id: UserId,
    pub brand: Option<String>,
}

impl ThreadFilter {
    pub fn for_owner(user_id: UserId) -> Self {
        Self { user_id, brand: None }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// Database response for a thread
#[derive(Debug, Clone, FromRow)]
pub struct ThreadDBResponse {
    pub id: ThreadId,
    pub user_id: UserId,
    pub thread_id: String,
    pub is_e: bool,
    pub is_c: bool,
    pub is_s: bool,
    pub brand: String,
    pub thread_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ThreadDBResponse {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
