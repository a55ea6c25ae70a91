//! Database repository for password reset tokens.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::password_reset_tokens::{PasswordResetToken, PasswordResetTokenCreateRequest},
    },
    types::UserId,
};

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at";

pub struct PasswordResetTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PasswordResetTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a token. A user holds at most one, so callers clear old tokens first; a concurrent
    /// insert for the same user fails with a unique violation on `password_reset_tokens_user_id_key`.
    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    pub async fn create(&mut self, request: &PasswordResetTokenCreateRequest) -> Result<PasswordResetToken> {
        let token = sqlx::query_as::<_, PasswordResetToken>(&format!(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(&request.token_hash)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(token)
    }

    /// Find a token by the hash of its raw value, expired or not, locking it for the transaction
    #[instrument(skip_all, err)]
    pub async fn find_by_token_hash(&mut self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        let token = sqlx::query_as::<_, PasswordResetToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM password_reset_tokens WHERE token_hash = $1 FOR UPDATE"
        ))
        .bind(token_hash)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(token)
    }

    /// Delete every token belonging to a user
    #[instrument(skip(self), err)]
    pub async fn delete_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
