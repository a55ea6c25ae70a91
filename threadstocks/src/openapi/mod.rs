//! OpenAPI document for the HTTP API, served at `/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Session token schemes: the `token` cookie set on login, or the same JWT as a bearer token.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by login or registration:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            Ignored when a session cookie is also sent.",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "token",
                    "Session cookie set by login or registration",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "threadStocks API", description = "Accounts and personal thread inventories"),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::forgot_password,
        api::handlers::auth::reset_password,
        api::handlers::users::get_current_user,
        api::handlers::users::update_password,
        api::handlers::threads::list_threads,
        api::handlers::threads::create_thread,
        api::handlers::threads::update_threads,
        api::handlers::threads::delete_threads,
        api::handlers::threads::get_thread,
        api::handlers::threads::update_thread,
        api::handlers::threads::delete_thread,
        api::handlers::contact::send_contact_message,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::auth::PasswordResetRequest,
            api::models::auth::PasswordResetConfirmRequest,
            api::models::auth::ChangePasswordRequest,
            api::models::users::UserResponse,
            api::models::threads::ThreadCreate,
            api::models::threads::ThreadUpdate,
            api::models::threads::ThreadBulkUpdate,
            api::models::threads::ThreadBulkDelete,
            api::models::threads::ThreadResponse,
            api::models::contact::ContactRequest,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login, and password reset"),
        (name = "users", description = "The signed-in user"),
        (name = "threads", description = "The signed-in user's threads"),
        (name = "contact", description = "Public contact form"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/register",
            "/login",
            "/logout",
            "/forgot-password",
            "/reset-password",
            "/contact",
            "/users/me",
            "/users/update-password",
            "/threads",
            "/threads/{id}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("BearerAuth"));
        assert!(schemes.contains_key("CookieAuth"));
    }
}
