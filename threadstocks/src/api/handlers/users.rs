use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{AuthSuccessResponse, ChangePasswordRequest},
        threads::ThreadResponse,
        users::UserResponse,
    },
    auth::current_user::CurrentUser,
    errors::Result,
    services::{AccountService, ThreadService},
};

/// Profile of the signed-in user, including their live threads
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn get_current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let user = AccountService::from(&state).get_user(current_user.id).await?;
    let threads = ThreadService::from(&state).list(current_user.id, None).await?;

    Ok(Json(
        UserResponse::from(user).with_threads(threads.into_iter().map(ThreadResponse::from).collect()),
    ))
}

/// Change the signed-in user's password
#[utoipa::path(
    put,
    path = "/users/update-password",
    request_body = ChangePasswordRequest,
    tag = "users",
    responses(
        (status = 200, description = "Password changed successfully", body = AuthSuccessResponse),
        (status = 400, description = "Passwords do not match or fail length rules"),
        (status = 401, description = "Current password is incorrect"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = [])
    )
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<AuthSuccessResponse>> {
    AccountService::from(&state).update_password(current_user.id, request).await?;

    Ok(Json(AuthSuccessResponse::new("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::users::UserResponse,
        services::ThreadService,
        test_utils::{bearer, create_test_server, create_test_user, session_cookie, test_thread},
    };
    use axum::http::{StatusCode, header};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_requires_session(pool: PgPool) {
        let (server, _state, _emails) = create_test_server(pool);

        let response = server.get("/users/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Missing authentication token");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_includes_live_threads_only(pool: PgPool) {
        let (server, state, _emails) = create_test_server(pool.clone());
        let (user, _) = create_test_user(&pool, "profile").await;
        let threads = ThreadService::new(&pool);
        let kept = threads.create(user.id, test_thread("310")).await.unwrap();
        let gone = threads.create(user.id, test_thread("321")).await.unwrap();
        threads.delete(user.id, gone.id).await.unwrap();

        let response = server
            .get("/users/me")
            .add_header(header::COOKIE, session_cookie(&state, user.id))
            .await;

        response.assert_status_ok();
        let raw: serde_json::Value = response.json();
        assert!(raw.get("password_hash").is_none());

        let body: UserResponse = response.json();
        assert_eq!(body.id, user.id);
        let listed: Vec<_> = body.threads.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(listed, vec![kept.id]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_password(pool: PgPool) {
        let (server, state, _emails) = create_test_server(pool.clone());
        let (user, password) = create_test_user(&pool, "changer").await;

        let wrong = server
            .put("/users/update-password")
            .add_header(header::AUTHORIZATION, bearer(&state, user.id))
            .json(&json!({
                "current_password": "not-my-password",
                "new_password": "fresh-password",
                "confirm_new_password": "fresh-password",
            }))
            .await;
        wrong.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.text(), "Current password is incorrect");

        let mismatch = server
            .put("/users/update-password")
            .add_header(header::AUTHORIZATION, bearer(&state, user.id))
            .json(&json!({
                "current_password": password,
                "new_password": "fresh-password",
                "confirm_new_password": "other-password",
            }))
            .await;
        mismatch.assert_status(StatusCode::BAD_REQUEST);

        let ok = server
            .put("/users/update-password")
            .add_header(header::AUTHORIZATION, bearer(&state, user.id))
            .json(&json!({
                "current_password": password,
                "new_password": "fresh-password",
                "confirm_new_password": "fresh-password",
            }))
            .await;
        ok.assert_status_ok();

        server
            .post("/login")
            .json(&json!({"email": user.email, "password": "fresh-password"}))
            .await
            .assert_status_ok();
    }
}
