//! Database record models matching table schemas.
//!
//! Models derive `sqlx::FromRow` and stay separate from the API models in
//! [`crate::api::models`], which convert from them.

pub mod password_reset_tokens;
pub mod threads;
pub mod users;
