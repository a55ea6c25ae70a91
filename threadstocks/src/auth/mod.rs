//! Authentication: password hashing, session tokens, and the middleware that guards routes.
//!
//! Sessions are stateless HS256 JWTs. A token is issued on register/login, sent back as an
//! HTTP-only cookie, and accepted from that cookie or from `Authorization: Bearer <token>`.
//! Logout only clears the cookie; tokens remain valid until they expire.
//!
//! ```ignore
//! use threadstocks::auth::current_user::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, user {}!", user.id)
//! }
//! ```
//!
//! - [`current_user`]: the [`current_user::CurrentUser`] extractor and token lookup
//! - [`middleware`]: [`middleware::require_session`], applied to every protected route
//! - [`password`]: Argon2id hashing and reset token generation
//! - [`session`]: JWT creation and verification

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
