//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//! - **[`payload`]**: JSON-or-multipart request body extraction
//!
//! # API Structure
//!
//! - **Authentication** (`/register`, `/login`, `/logout`, `/forgot-password`, `/reset-password`)
//! - **Users** (`/users/*`): profile and password change, session required
//! - **Threads** (`/threads`, `/threads/{id}`): session required
//! - **Contact** (`/contact`)
//!
//! The OpenAPI document is served at `/openapi.json`.

pub mod handlers;
pub mod models;
pub mod payload;
