//! Database models for password reset tokens.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{PasswordResetTokenId, UserId};

/// Database entity model. Only the SHA-256 of the emailed token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: PasswordResetTokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Request for creating a password reset token
#[derive(Debug, Clone)]
pub struct PasswordResetTokenCreateRequest {
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
