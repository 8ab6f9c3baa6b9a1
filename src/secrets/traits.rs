//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! Keys are namespaced strings (`github.pat`); values are raw secrets that
//! must never reach logs, `Debug` output, or error messages.

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages describe the failing operation only, never the secret value.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secret store: {0}")]
    ReadError(String),

    /// Failed to write to secret storage.
    #[error("failed to write secret store: {0}")]
    WriteError(String),

    /// Provider not available or not configured.
    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Key-value storage for credentials.
pub trait SecretStore: Send + Sync {
    /// Get a secret by key; `Ok(None)` when it was never stored.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Store a secret, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Remove a secret. Removing a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Check if a secret exists.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_describe_operation() {
        assert!(SecretError::ReadError("disk".into())
            .to_string()
            .contains("read"));
        assert!(SecretError::WriteError("disk".into())
            .to_string()
            .contains("write"));
        assert!(SecretError::ProviderNotAvailable("vault".into())
            .to_string()
            .contains("vault"));
    }
}
