//! HTTP request handlers for all API endpoints.
//!
//! Handlers decode the request, delegate to [`crate::services`], and shape the response. Routes
//! behind [`require_session`](crate::auth::middleware::require_session) take a
//! [`CurrentUser`](crate::auth::current_user::CurrentUser) argument.
//!
//! - [`auth`]: registration, login, logout, and password reset
//! - [`users`]: the signed-in user's profile and password change
//! - [`threads`]: thread CRUD and batch operations
//! - [`contact`]: public contact form

pub mod auth;
pub mod contact;
pub mod threads;
pub mod users;
