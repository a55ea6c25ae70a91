//! Account lifecycle: registration, login, password reset, and password change.

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use crate::{
    AppState,
    api::models::auth::{ChangePasswordRequest, LoginRequest, PasswordResetConfirmRequest, RegisterRequest},
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::Config,
    db::{
        handlers::{PasswordResetTokens, Repository, Users},
        models::{
            password_reset_tokens::PasswordResetTokenCreateRequest,
            users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
        },
    },
    errors::{Error, Result},
    notifications::{EmailJob, EmailQueue},
    types::UserId,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A freshly authenticated user and the session token issued for them
#[derive(Debug)]
pub struct Session {
    pub user: UserDBResponse,
    pub token: String,
}

pub struct AccountService<'a> {
    db: &'a PgPool,
    config: &'a Config,
    emails: &'a EmailQueue,
}

impl<'a> From<&'a AppState> for AccountService<'a> {
    fn from(state: &'a AppState) -> Self {
        Self::new(&state.db, &state.config, &state.emails)
    }
}

impl<'a> AccountService<'a> {
    pub fn new(db: &'a PgPool, config: &'a Config, emails: &'a EmailQueue) -> Self {
        Self { db, config, emails }
    }

    /// Hash on a blocking thread; Argon2 is deliberately slow
    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let params = Argon2Params::from(&self.config.auth.password);
        tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, params))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password hashing task: {e}"),
            })?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })?
    }

    /// Check a new password and its confirmation
    fn validate_new_password(&self, password: &str, confirmation: &str) -> Result<()> {
        if password != confirmation {
            return Err(Error::bad_request("Passwords do not match"));
        }
        password::validate_password_length(password, &self.config.auth.password)
    }

    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Session> {
        if !self.config.auth.allow_registration {
            return Err(Error::bad_request("User registration is disabled"));
        }

        let username = request.username.trim();
        let email = request.email.trim();
        if username.is_empty() {
            return Err(Error::bad_request("Username is required"));
        }
        if email.is_empty() {
            return Err(Error::bad_request("Email is required"));
        }
        self.validate_new_password(&request.password, &request.confirm_password)?;

        let mut conn = self.db.acquire().await?;
        let mut users = Users::new(&mut conn);

        if users.get_user_by_email(email).await?.is_some() {
            return Err(Error::Conflict {
                message: "An account with this email address already exists".to_string(),
            });
        }
        if users.get_user_by_username(username).await?.is_some() {
            return Err(Error::Conflict {
                message: "This username is already taken".to_string(),
            });
        }

        let password_hash = self.hash_password(&request.password).await?;

        // A concurrent registration can still win the race; the unique violation maps to 409
        let user = users
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = user.id, "User registered");

        let token = session::create_session_token(user.id, self.config)?;
        Ok(Session { user, token })
    }

    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        let mut conn = self.db.acquire().await?;
        let Some(user) = Users::new(&mut conn).get_user_by_email(request.email.trim()).await? else {
            // One argon2 run either way, so response time does not reveal which emails exist
            self.hash_password(&request.password).await?;
            debug!("Login rejected: unknown email");
            return Err(Error::unauthenticated(INVALID_CREDENTIALS));
        };

        if !self.verify_password(&request.password, &user.password_hash).await? {
            debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(Error::unauthenticated(INVALID_CREDENTIALS));
        }

        let token = session::create_session_token(user.id, self.config)?;
        Ok(Session { user, token })
    }

    /// Issue a reset token and queue the email carrying it. Succeeds whether or not the address
    /// belongs to an account.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let Some(user) = Users::new(&mut tx).get_user_by_email(email.trim()).await? else {
            info!("Password reset requested for an unknown email address");
            return Ok(());
        };

        let lifetime = chrono::Duration::from_std(self.config.auth.password_reset_token_duration).map_err(|e| Error::Internal {
            operation: format!("convert reset token duration: {e}"),
        })?;
        let raw_token = password::generate_reset_token();
        let request = PasswordResetTokenCreateRequest {
            user_id: user.id,
            token_hash: password::hash_reset_token(&raw_token),
            expires_at: Utc::now() + lifetime,
        };

        let mut tokens = PasswordResetTokens::new(&mut tx);
        tokens.delete_for_user(user.id).await?;
        match tokens.create(&request).await {
            Ok(_) => {}
            Err(e) if e.is_unique_violation_on("password_reset_tokens_user_id_key") => {
                // Another request for the same user committed first; its email is on the way
                warn!(user_id = user.id, "Concurrent password reset request, keeping the other token");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        info!(user_id = user.id, "Password reset token issued");
        self.emails.enqueue(EmailJob::PasswordReset {
            to_email: user.email,
            to_name: user.username,
            token: raw_token,
        });

        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, request: PasswordResetConfirmRequest) -> Result<()> {
        self.validate_new_password(&request.new_password, &request.confirm_password)?;
        let password_hash = self.hash_password(&request.new_password).await?;

        let mut tx = self.db.begin().await?;

        let token = PasswordResetTokens::new(&mut tx)
            .find_by_token_hash(&password::hash_reset_token(&request.token))
            .await?
            .ok_or_else(|| Error::unauthenticated("Invalid or expired token"))?;

        if token.is_expired_at(Utc::now()) {
            PasswordResetTokens::new(&mut tx).delete_for_user(token.user_id).await?;
            tx.commit().await?;
            info!(user_id = token.user_id, "Expired password reset token purged");
            return Err(Error::unauthenticated("Token expired"));
        }

        Users::new(&mut tx)
            .update(
                token.user_id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                },
            )
            .await?;
        PasswordResetTokens::new(&mut tx).delete_for_user(token.user_id).await?;

        tx.commit().await?;

        info!(user_id = token.user_id, "Password reset");
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn update_password(&self, user_id: UserId, request: ChangePasswordRequest) -> Result<()> {
        self.validate_new_password(&request.new_password, &request.confirm_new_password)?;

        let mut conn = self.db.acquire().await?;
        let mut users = Users::new(&mut conn);

        let user = users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::unauthenticated("User not found"))?;

        if !self.verify_password(&request.current_password, &user.password_hash).await? {
            return Err(Error::unauthenticated("Current password is incorrect"));
        }

        let password_hash = self.hash_password(&request.new_password).await?;
        users
            .update(
                user_id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                },
            )
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserDBResponse> {
        let mut conn = self.db.acquire().await?;
        Users::new(&mut conn).get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        })
    }
}
