use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Regex patterns used for log redaction. All are vetted literals.
pub struct PiiRegexRegistry;

impl PiiRegexRegistry {
    pub fn email() -> &'static Regex {
        static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap()
        });
        &EMAIL_REGEX
    }

    /// Session tokens: three dot-joined base64url segments.
    pub fn session_token() -> &'static Regex {
        static SESSION_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}").unwrap()
        });
        &SESSION_TOKEN_REGEX
    }

    /// Opaque runs of 16+ base64url or hex characters (one-time tokens, secrets).
    pub fn opaque_token() -> &'static Regex {
        static OPAQUE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"\b[A-Za-z0-9_+/-]{16,}={0,2}").unwrap()
        });
        &OPAQUE_TOKEN_REGEX
    }
}

/// Mask emails (first character of the local part kept) and tokens.
///
/// Emails are handled first so their domains are not mistaken for tokens.
pub fn redact(input: &str) -> String {
    let email_redacted = PiiRegexRegistry::email().replace_all(input, |caps: &regex::Captures| {
        let full_match = &caps[0];
        match full_match.find('@') {
            Some(0) | None => full_match.to_string(),
            Some(at_pos) => {
                let (local, domain) = full_match.split_at(at_pos);
                format!("{}***{domain}", &local[..1])
            }
        }
    });

    let session_redacted =
        PiiRegexRegistry::session_token().replace_all(&email_redacted, "[REDACTED_TOKEN]");

    PiiRegexRegistry::opaque_token()
        .replace_all(&session_redacted, "[REDACTED_TOKEN]")
        .to_string()
}

/// Displays its contents through [`redact`].
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(self.0))
    }
}
