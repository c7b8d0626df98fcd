//! Session tokens, password hashing and authorization guards.

pub mod claims;
pub mod guards;
pub mod password;
pub mod token;

pub use claims::{Claims, Role};
pub use guards::{authenticate_optional, extract_from_request, require_admin, require_authenticated};
pub use token::{TokenAuthority, TokenError};
