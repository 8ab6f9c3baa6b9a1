//! auth::errors
//!
//! Authentication error types.
//!
//! Error messages never contain token values.
//!
//! ```
//! use hubkit::auth::AuthError;
//!
//! let err = AuthError::NotAuthenticated("api.github.com".to_string());
//! assert!(err.to_string().contains("api.github.com"));
//! ```

use thiserror::Error;

use crate::secrets::SecretError;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token is configured for the host.
    #[error("not authenticated for host '{0}'. Run 'hubkit auth login' or set HUBKIT_TOKEN.")]
    NotAuthenticated(String),

    /// A token was supplied but is unusable (empty, whitespace).
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Error from secret storage.
    #[error("secret store error: {0}")]
    SecretStore(String),
}

impl From<SecretError> for AuthError {
    fn from(err: SecretError) -> Self {
        AuthError::SecretStore(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_errors_convert() {
        let err: AuthError = SecretError::ReadError("permission denied".into()).into();
        assert!(matches!(err, AuthError::SecretStore(_)));
        assert!(err.to_string().contains("permission denied"));
    }
}
