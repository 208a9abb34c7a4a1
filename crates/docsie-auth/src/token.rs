//! Token minting and verification
//!
//! The Docsie platform generates its own tokens as `jwt.encode({'exp': exp},
//! master_key)` and validates ours the same way, so anything beyond the
//! `exp` claim (issuer, audience, subject, issued-at) makes the widget
//! reject the token. `verify` enforces that shape when reading tokens back.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use common::Secret;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::DEFAULT_EXPIRY_MINUTES;
use crate::error::{Error, Result};

/// Payload of an issued token. Serializes to exactly `{"exp": <secs>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Absolute expiry, unix seconds
    pub exp: u64,
}

/// A freshly minted token together with its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Stateless issuer of `exp`-only HS256 tokens.
///
/// Cheap to clone; holds the prepared signing key and the configured lifetime.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    expiry_minutes: u64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("key", &"[REDACTED]")
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

impl TokenIssuer {
    /// Build an issuer from an explicit master key and lifetime.
    pub fn new(secret: &Secret<String>, expiry_minutes: u64) -> Result<Self> {
        if secret.expose().is_empty() {
            return Err(Error::MissingSecret);
        }
        if expiry_minutes == 0 {
            return Err(Error::InvalidExpiry(
                "expiry must be a positive number of minutes".into(),
            ));
        }
        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            expiry_minutes,
        })
    }

    /// Build an issuer from raw settings as they arrive from the environment.
    ///
    /// A missing master key is fatal. A missing expiry falls back to
    /// `DEFAULT_EXPIRY_MINUTES`; a present one must be a positive integer.
    pub fn from_settings(secret: Option<&Secret<String>>, expiry: Option<&str>) -> Result<Self> {
        let secret = secret.ok_or(Error::MissingSecret)?;
        let minutes = parse_expiry_minutes(expiry)?;
        Self::new(secret, minutes)
    }

    pub fn expiry_minutes(&self) -> u64 {
        self.expiry_minutes
    }

    /// Issue a token expiring `expiry_minutes` from now.
    ///
    /// `subject_hint` identifies the requester in logs only.
    pub fn issue(&self, subject_hint: &str) -> Result<IssuedToken> {
        self.issue_at(subject_hint, unix_now())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    pub fn issue_at(&self, subject_hint: &str, now: u64) -> Result<IssuedToken> {
        let expires_at = now.saturating_add(self.expiry_minutes.saturating_mul(60));
        let claims = TokenClaims { exp: expires_at };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| Error::Signing(e.to_string()))?;

        info!(
            subject = subject_hint,
            expires_at,
            expiry_minutes = self.expiry_minutes,
            "issued docsie token (exp only)"
        );

        Ok(IssuedToken { token, expires_at })
    }
}

/// Parse the configured lifetime in minutes.
///
/// `None` or a blank value yields the default.
pub fn parse_expiry_minutes(raw: Option<&str>) -> Result<u64> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_EXPIRY_MINUTES);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(Error::InvalidExpiry(format!(
            "{raw:?} is not a positive number of minutes"
        ))),
        Ok(minutes) => Ok(minutes),
        Err(e) => Err(Error::InvalidExpiry(format!("{raw:?}: {e}"))),
    }
}

/// Verify a token the way the widget platform does and return its claims.
///
/// Rejects tokens that carry any claim besides `exp`.
pub fn verify(token: &str, secret: &Secret<String>) -> Result<TokenClaims> {
    if secret.expose().is_empty() {
        return Err(Error::MissingSecret);
    }

    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<serde_json::Map<String, serde_json::Value>>(token, &key, &validation)
        .map_err(map_jwt_error)?;

    if data.claims.len() != 1 {
        debug!(claims = data.claims.len(), "token carries unexpected claims");
        return Err(Error::MalformedToken);
    }

    let exp = data
        .claims
        .get("exp")
        .and_then(serde_json::Value::as_u64)
        .ok_or(Error::MalformedToken)?;

    Ok(TokenClaims { exp })
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> Error {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => Error::InvalidSignature,
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::MalformedToken,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
