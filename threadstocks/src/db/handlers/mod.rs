//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open transaction) and
//! returns models from [`crate::db::models`]. Callers that need several statements to commit
//! together open a transaction and build repositories from it:
//!
//! ```ignore
//! use threadstocks::db::handlers::{Repository, Threads};
//!
//! let mut tx = pool.begin().await?;
//! let thread = Threads::new(&mut tx).get_by_id(id).await?;
//! tx.commit().await?;
//! ```
//!
//! - [`Users`]: accounts and credentials
//! - [`Threads`]: owned thread records with soft delete
//! - [`PasswordResetTokens`]: single-use reset tokens

pub mod password_reset_tokens;
pub mod repository;
pub mod threads;
pub mod users;

pub use password_reset_tokens::PasswordResetTokens;
pub use repository::Repository;
pub use threads::Threads;
pub use users::Users;
