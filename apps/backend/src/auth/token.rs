//! Stateless signed session tokens.
//!
//! A token is three dot-joined segments, each unpadded URL-safe base64:
//!
//! ```text
//! base64url({"alg":"HMAC-SHA256","type":"token"})
//!   . base64url(json(claims))
//!   . base64url(HMAC-SHA256(secret, segment1 "." segment2))
//! ```
//!
//! There is no server-side session state. A token stays valid until `exp`
//! (plus leeway) passes; rotating the secret invalidates every token.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::auth::claims::{
    Claims, Role, CLAIM_EXPIRES_AT, CLAIM_ID, CLAIM_ISSUED_AT, CLAIM_NOT_BEFORE, CLAIM_ROLE,
};
use crate::error::AppError;
use crate::state::security_config::SecurityConfig;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_ALGORITHM: &str = "HMAC-SHA256";
pub const TOKEN_TYPE: &str = "token";
/// Lifetime of an issued token: 7 days.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Clock-skew tolerance applied to `exp`, `nbf` and `iat`.
pub const LEEWAY_SECS: i64 = 30;

const BEARER_PREFIX: &str = "Bearer ";

/// Reasons a token is rejected or cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token is not valid yet")]
    NotYetValid,
    #[error("Token issue time is in the future")]
    InvalidIssueTime,
    #[error("Invalid claims: {0}")]
    InvalidClaims(&'static str),
}

#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

const HEADER: TokenHeader = TokenHeader {
    alg: TOKEN_ALGORITHM,
    kind: TOKEN_TYPE,
};

/// Issues and verifies session tokens with the process-wide secret.
///
/// Holds a pre-keyed HMAC state that is cloned per call, so the authority
/// can be shared across workers without locking.
#[derive(Clone)]
pub struct TokenAuthority {
    keyed_mac: HmacSha256,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("algorithm", &TOKEN_ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub fn new(security: &SecurityConfig) -> Result<Self, AppError> {
        let keyed_mac = HmacSha256::new_from_slice(security.token_secret())
            .map_err(|e| AppError::config(format!("token secret rejected: {e}")))?;
        Ok(Self { keyed_mac })
    }

    /// Issue a token for `claims`, stamping `iat`/`exp` from the current time.
    pub fn issue(&self, claims: Claims) -> Result<String, TokenError> {
        self.issue_at(claims, SystemTime::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// `claims` must carry a non-negative integer `id` and a `role` of
    /// `"admin"` or `"user"`.
    pub fn issue_at(&self, mut claims: Claims, now: SystemTime) -> Result<String, TokenError> {
        match claims.get(CLAIM_ID).and_then(Value::as_i64) {
            Some(id) if id >= 0 => {}
            _ => return Err(TokenError::InvalidClaims("id must be a non-negative integer")),
        }
        match claims.get(CLAIM_ROLE).and_then(Value::as_str) {
            Some(role) if role.parse::<Role>().is_ok() => {}
            _ => return Err(TokenError::InvalidClaims("role must be \"admin\" or \"user\"")),
        }

        let iat = unix_seconds(now);
        claims.insert(CLAIM_ISSUED_AT, iat);
        claims.insert(CLAIM_EXPIRES_AT, iat + TOKEN_TTL_SECS);

        self.encode(&claims)
    }

    /// Encode and sign `claims` verbatim, without adding time claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = serde_json::to_vec(&HEADER)
            .map_err(|_| TokenError::InvalidClaims("header is not serializable"))?;
        let body = serde_json::to_vec(claims)
            .map_err(|_| TokenError::InvalidClaims("claims are not serializable"))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(body)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify `token` against the current time and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, SystemTime::now())
    }

    /// Verify `token` as if the current time were `now`.
    ///
    /// A leading `"Bearer "` scheme is tolerated.
    pub fn verify_at(&self, token: &str, now: SystemTime) -> Result<Claims, TokenError> {
        let token = token.trim();
        let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);

        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = parts.as_slice() else {
            return Err(TokenError::Malformed);
        };
        if header_b64.is_empty() || claims_b64.is_empty() || signature_b64.is_empty() {
            return Err(TokenError::Malformed);
        }

        let header: Map<String, Value> = decode_json(header_b64)?;
        if header.get("alg").and_then(Value::as_str) != Some(TOKEN_ALGORITHM) {
            return Err(TokenError::Malformed);
        }

        let provided = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        let expected = self.sign(token[..signing_input_len].as_bytes());
        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            return Err(TokenError::InvalidSignature);
        }

        let claims: Map<String, Value> = decode_json(claims_b64)?;
        let claims = Claims::from(claims);

        check_times(&claims, unix_seconds(now))?;

        Ok(claims)
    }

    fn sign(&self, signing_input: &[u8]) -> [u8; 32] {
        let mut mac = self.keyed_mac.clone();
        mac.update(signing_input);
        let mut output = [0u8; 32];
        output.copy_from_slice(&mac.finalize().into_bytes());
        output
    }
}

fn decode_json(segment: &str) -> Result<Map<String, Value>, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Read an optional integer time claim. `null` counts as absent.
fn time_claim(claims: &Claims, key: &str) -> Result<Option<i64>, TokenError> {
    match claims.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or(TokenError::Malformed),
    }
}

fn check_times(claims: &Claims, now: i64) -> Result<(), TokenError> {
    let exp = time_claim(claims, CLAIM_EXPIRES_AT)?.ok_or(TokenError::Malformed)?;
    if exp.saturating_add(LEEWAY_SECS) < now {
        return Err(TokenError::Expired);
    }

    if let Some(nbf) = time_claim(claims, CLAIM_NOT_BEFORE)? {
        if nbf.saturating_sub(LEEWAY_SECS) > now {
            return Err(TokenError::NotYetValid);
        }
    }

    if let Some(iat) = time_claim(claims, CLAIM_ISSUED_AT)? {
        if iat.saturating_sub(LEEWAY_SECS) > now {
            return Err(TokenError::InvalidIssueTime);
        }
    }

    Ok(())
}

fn unix_seconds(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
