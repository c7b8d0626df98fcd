//! Unique test data, so tests sharing a store never collide.

use ulid::Ulid;

/// `{prefix}-{ulid}`
pub fn unique_str(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new())
}

/// `{prefix}-{ulid}@example.test`
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", Ulid::new())
}

/// Username made only of ASCII letters, digits and underscores.
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", Ulid::new()).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_unique() {
        assert_ne!(unique_str("x"), unique_str("x"));
        assert_ne!(unique_email("x"), unique_email("x"));
    }

    #[test]
    fn test_username_charset() {
        let name = unique_username("user");
        assert!(name.starts_with("user_"));
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_email_shape() {
        let email = unique_email("reader");
        assert!(email.starts_with("reader-"));
        assert!(email.ends_with("@example.test"));
    }
}
