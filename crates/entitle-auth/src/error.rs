//! Authentication error types.

use entitle_core::error::EntitleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("account is inactive")]
    AccountInactive,

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Repository(#[from] EntitleError),
}

impl AuthError {
    /// Stable code for transport layers and audit metadata.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenExpired => "token_expired",
            Self::TokenInvalid(_) => "token_invalid",
            Self::AccountInactive => "account_inactive",
            Self::Crypto(_) | Self::Repository(_) => "internal",
        }
    }
}
