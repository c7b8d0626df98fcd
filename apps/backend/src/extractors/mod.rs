pub mod auth_user;
pub mod validated_json;

pub use auth_user::{AdminUser, AuthUser, MaybeUser};
pub use validated_json::ValidatedJson;
