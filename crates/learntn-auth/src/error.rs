//! Error types for credential handling

use learntn_core::CoreError;
use thiserror::Error;

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while issuing, verifying or gating credentials
#[derive(Error, Debug)]
pub enum AuthError {
    /// No bearer credential on the request
    #[error("No token provided")]
    MissingCredential,

    /// Credential could not be parsed
    #[error("Malformed credential: {0}")]
    Malformed(String),

    /// Credential is past its expiry
    #[error("Token expired")]
    Expired,

    /// Signature or claim check failed
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Refresh credential is not the one currently in the identity's slot
    #[error("Invalid or revoked refresh token")]
    Revoked,

    /// Login rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Role not permitted for the operation
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Refresh-slot backend failure
    #[error("Credential store error: {0}")]
    Store(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether presenting a refresh token could recover from this failure
    pub fn rotation_may_help(&self) -> bool {
        matches!(self, AuthError::Expired)
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::Invalid(err.to_string()),
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => AuthError::Malformed(err.to_string()),
            _ => AuthError::Invalid(err.to_string()),
        }
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        AuthError::Forbidden(err.to_string())
    }
}
