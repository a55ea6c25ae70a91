//! Business rules, kept apart from HTTP concerns.
//!
//! Handlers decode requests and encode responses; services validate input, enforce ownership,
//! run the repository calls inside the right transactions, and return domain results or
//! [`Error`](crate::errors::Error)s.
//!
//! - [`accounts`]: registration, login, password reset and change
//! - [`threads`]: ownership-scoped thread CRUD and batch operations

pub mod accounts;
pub mod threads;

pub use accounts::{AccountService, Session};
pub use threads::ThreadService;
