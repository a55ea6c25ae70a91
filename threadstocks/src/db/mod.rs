//! Database layer: PostgreSQL through SQLx, organised as repositories.
//!
//! ```text
//! services  →  db::handlers (repositories)  →  db::models  →  PostgreSQL
//! ```
//!
//! Migrations live in `migrations/` and run on startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
