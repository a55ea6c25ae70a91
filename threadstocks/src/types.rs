//! Common type definitions.
//!
//! - Type aliases for entity IDs ([`UserId`], [`ThreadId`], [`PasswordResetTokenId`])
//! - [`Operation`], the action named in ownership failures

use std::fmt;

// Type aliases for IDs. All primary keys are BIGSERIAL.
pub type UserId = i64;
pub type ThreadId = i64;
pub type PasswordResetTokenId = i64;

/// Operations that can be attempted on an owned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}
