//! API request and response data models.
//!
//! These types define the public HTTP contract and are kept separate from the database models in
//! [`crate::db::models`]. Every type is annotated with `utoipa` so it appears in the OpenAPI
//! document. Request types that may be posted as forms implement
//! [`FromForm`](crate::api::payload::FromForm).
//!
//! - [`auth`]: login, registration, and password management payloads
//! - [`users`]: the user profile returned to clients
//! - [`threads`]: thread create/update/bulk payloads and responses
//! - [`contact`]: the public contact form

pub mod auth;
pub mod contact;
pub mod threads;
pub mod users;
