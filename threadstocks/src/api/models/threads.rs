//! API request/response models for threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::payload::{FormFields, FromForm},
    db::models::threads::{ThreadDBResponse, ThreadUpdateDBRequest},
    errors::Error,
    types::{ThreadId, UserId},
};

/// Request to create a thread. Omitted flags default to false, an omitted count to 0.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadCreate {
    /// External identifier, unique among the caller's threads
    pub thread_id: String,
    #[serde(default)]
    pub is_e: bool,
    #[serde(default)]
    pub is_c: bool,
    #[serde(default)]
    pub is_s: bool,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub thread_count: i64,
}

impl FromForm for ThreadCreate {
    fn from_form(mut fields: FormFields) -> Result<Self, Error> {
        Ok(Self {
            is_e: fields.optional_bool("is_e")?.unwrap_or_default(),
            is_c: fields.optional_bool("is_c")?.unwrap_or_default(),
            is_s: fields.optional_bool("is_s")?.unwrap_or_default(),
            thread_count: fields.optional_i64("thread_count")?.unwrap_or_default(),
            brand: fields.optional_text("brand").unwrap_or_default(),
            thread_id: fields.required_text("thread_id")?,
        })
    }
}

/// Partial update. Only the fields present are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ThreadUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_e: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_c: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_s: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_count: Option<i64>,
}

impl From<ThreadUpdate> for ThreadUpdateDBRequest {
    fn from(update: ThreadUpdate) -> Self {
        Self {
            thread_id: update.thread_id,
            is_e: update.is_e,
            is_c: update.is_c,
            is_s: update.is_s,
            brand: update.brand,
            thread_count: update.thread_count,
        }
    }
}

/// One entry of a bulk update: the thread to change and the fields to set on it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadBulkUpdate {
    pub id: ThreadId,
    #[serde(flatten)]
    pub changes: ThreadUpdate,
}

/// Threads to delete in one batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadBulkDelete {
    pub ids: Vec<ThreadId>,
}

/// Query parameters for listing threads
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ThreadListQuery {
    /// Only return threads with this brand
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
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
}

impl From<ThreadDBResponse> for ThreadResponse {
    fn from(db: ThreadDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            thread_id: db.thread_id,
            is_e: db.is_e,
            is_c: db.is_c,
            is_s: db.is_s,
            brand: db.brand,
            thread_count: db.thread_count,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
