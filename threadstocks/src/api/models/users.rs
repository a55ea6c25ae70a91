//! API response models for users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{api::models::threads::ThreadResponse, db::models::users::UserDBResponse, types::UserId};

/// A user as seen by clients. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The user's live threads (only included on the profile endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<Vec<ThreadResponse>>,
}

impl UserResponse {
    pub fn with_threads(mut self, threads: Vec<ThreadResponse>) -> Self {
        self.threads = Some(threads);
        self
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            created_at: db.created_at,
            updated_at: db.updated_at,
            threads: None,
        }
    }
}
