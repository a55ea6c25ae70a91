use crate::{
    AppState,
    auth::{
        current_user::{CurrentUser, extract_session_token},
        session,
    },
    errors::Error,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::trace;

/// Reject requests without a valid session token; otherwise attach [`CurrentUser`] to the
/// request extensions and continue.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let token = extract_session_token(request.headers(), &state.config)
        .ok_or_else(|| Error::unauthenticated("Missing authentication token"))?;

    let user_id = session::verify_session_token(token, &state.config).map_err(|e| match e {
        Error::Unauthenticated { .. } => Error::unauthenticated("Invalid or expired token"),
        other => other,
    })?;

    trace!(user_id, "Authenticated session");
    request.extensions_mut().insert(CurrentUser { id: user_id });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_lazy_state;
    use axum::{
        Router,
        http::{HeaderValue, StatusCode, header},
        middleware::from_fn_with_state,
        routing::get,
    };
    use axum_test::TestServer;

    async fn whoami(user: CurrentUser) -> String {
        user.id.to_string()
    }

    fn server() -> (TestServer, AppState) {
        let state = create_lazy_state();
        let router = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), require_session))
            .with_state(state.clone());
        (TestServer::new(router).unwrap(), state)
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (server, _) = server();

        let response = server.get("/whoami").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cookie_token_attaches_identity() {
        let (server, state) = server();
        let token = session::create_session_token(17, &state.config).unwrap();

        let response = server
            .get("/whoami")
            .add_header(header::COOKIE, HeaderValue::from_str(&format!("token={token}")).unwrap())
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "17");
    }

    #[tokio::test]
    async fn test_bearer_token_attaches_identity() {
        let (server, state) = server();
        let token = session::create_session_token(23, &state.config).unwrap();

        let response = server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "23");
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let (server, _) = server();

        let response = server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not.a.jwt"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_not_rescued_by_bearer() {
        let (server, state) = server();
        let token = session::create_session_token(5, &state.config).unwrap();

        let response = server
            .get("/whoami")
            .add_header(header::COOKIE, HeaderValue::from_static("token=garbage"))
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
