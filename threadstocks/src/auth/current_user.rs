//! The authenticated caller, and where its session token is read from.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::{config::Config, errors::Error, types::UserId};

/// Identity of the caller, placed in request extensions by
/// [`require_session`](crate::auth::middleware::require_session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
}

/// Value of the named cookie, if the request carries it
fn token_from_cookie<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
}

fn token_from_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Session token for a request: the session cookie if present, otherwise an
/// `Authorization: Bearer` header. A present cookie wins even if its token is bad.
pub fn extract_session_token<'a>(headers: &'a HeaderMap, config: &Config) -> Option<&'a str> {
    token_from_cookie(headers, &config.auth.session.cookie_name)
        .or_else(|| token_from_bearer(headers))
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(Error::Unauthenticated { message: None })
    }
}
