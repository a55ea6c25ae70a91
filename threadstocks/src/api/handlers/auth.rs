use axum::{Json, extract::State, http::HeaderValue};

use crate::{
    AppState,
    api::{
        models::{
            auth::{
                AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, PasswordResetConfirmRequest,
                PasswordResetRequest, RegisterRequest, RegisterResponse,
            },
            users::UserResponse,
        },
        payload::Payload,
    },
    config::Config,
    errors::{Error, Result},
    services::AccountService,
};

/// Register a new account and start a session
#[utoipa::path(
    post,
    path = "/register",
    request_body(
        content = RegisterRequest,
        content_type = "application/json",
        description = "Also accepted as multipart/form-data"
    ),
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid request or registration disabled"),
        (status = 409, description = "Username or email already in use"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Payload(request): Payload<RegisterRequest>) -> Result<RegisterResponse> {
    let session = AccountService::from(&state).register(request).await?;
    let cookie = create_session_cookie(&session.token, &state.config)?;

    Ok(RegisterResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(session.user),
            message: "Registration successful".to_string(),
        },
        cookie,
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body(
        content = LoginRequest,
        content_type = "application/json",
        description = "Also accepted as multipart/form-data"
    ),
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Payload(request): Payload<LoginRequest>) -> Result<LoginResponse> {
    let session = AccountService::from(&state).login(request).await?;
    let cookie = create_session_cookie(&session.token, &state.config)?;

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(session.user),
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout (clear the session cookie)
///
/// Tokens are not revoked server side; a copied token stays valid until it expires.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse> {
    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse::new("Logout successful"),
        cookie: clear_session_cookie(&state.config)?,
    })
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = PasswordResetRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<AuthSuccessResponse>> {
    AccountService::from(&state).forgot_password(&request.email).await?;

    // Same answer whether or not the address is registered
    Ok(Json(AuthSuccessResponse::new(
        "If an account with that email exists, a password reset link has been sent.",
    )))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = PasswordResetConfirmRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password reset successful", body = AuthSuccessResponse),
        (status = 400, description = "Passwords do not match or fail length rules"),
        (status = 401, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<Json<AuthSuccessResponse>> {
    AccountService::from(&state).reset_password(request).await?;

    Ok(Json(AuthSuccessResponse::new("Password has been reset successfully")))
}

fn same_site_attribute(value: &str) -> &'static str {
    match value.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

fn session_cookie(value: &str, max_age_secs: u64, config: &Config) -> Result<HeaderValue> {
    let session = &config.auth.session;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        session.cookie_name,
        value,
        same_site_attribute(&session.cookie_same_site),
        max_age_secs
    );
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).map_err(|e| Error::Internal {
        operation: format!("build session cookie: {e}"),
    })
}

/// `Set-Cookie` value carrying a session token
pub(crate) fn create_session_cookie(token: &str, config: &Config) -> Result<HeaderValue> {
    session_cookie(token, config.auth.session.cookie_max_age.as_secs(), config)
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub(crate) fn clear_session_cookie(config: &Config) -> Result<HeaderValue> {
    session_cookie("", 0, config)
}
