//! Error types for token issuance and verification

/// Errors from token operations.
///
/// `MissingSecret` and `InvalidExpiry` are configuration errors: the service
/// must refuse to start rather than issue tokens the platform will reject.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("master key is not configured")]
    MissingSecret,

    #[error("invalid token expiry: {0}")]
    InvalidExpiry(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("malformed token")]
    MalformedToken,
}

impl Error {
    /// True for errors that indicate broken configuration rather than a bad token.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::MissingSecret | Error::InvalidExpiry(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
