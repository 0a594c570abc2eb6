// Auth errors.

use iam_core::errors::{ErrorKind, IamError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("invalid signer configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signature was not issued for {0}")]
    UrlMismatch(String),

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidSignature(_) | AuthError::UrlMismatch(_) => ErrorKind::NotAuthenticated,
            AuthError::InvalidUrl { .. } => ErrorKind::BadRequest,
            AuthError::MissingSecret | AuthError::InvalidConfig(_) | AuthError::Hash(_) => ErrorKind::GeneralError,
        }
    }

    pub fn into_anyhow(self) -> anyhow::Error {
        IamError::from(self).into_anyhow()
    }
}

impl From<AuthError> for IamError {
    fn from(err: AuthError) -> Self {
        IamError::new(err.kind(), err.to_string())
    }
}
