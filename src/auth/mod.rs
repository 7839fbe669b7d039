//! Authentication — password login, JWT sessions, route protection
//!
//! - `jwt` — token encoding/decoding
//! - `middleware` — `require_auth` for the protected router
//! - `extractor` — `AuthUser` handler parameter

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::AuthUser;
pub use jwt::{decode_jwt, encode_jwt, issue_token, Claims};
pub use middleware::require_auth;
