//! auth
//!
//! Bearer tokens for the forge adapter.
//!
//! Tokens are personal access tokens. They come either from the caller
//! directly ([`StaticTokenProvider`]) or from the secret store under
//! [`crate::secrets::GITHUB_TOKEN_KEY`] ([`StoredTokenProvider`]).
//!
//! Tokens never appear in logs, errors, JSON output or `Debug` output; the
//! types here implement `Debug` by hand to redact them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hubkit::auth::{StoredTokenProvider, TokenProvider};
//!
//! let store = hubkit::secrets::create_store("file")?;
//! let provider = Arc::new(StoredTokenProvider::new("api.github.com", store));
//! let token = provider.bearer_token().await?;
//! ```

mod errors;

pub use errors::AuthError;

use std::fmt;

use async_trait::async_trait;

use crate::secrets::{SecretStore, GITHUB_TOKEN_KEY};

/// Source of bearer tokens for forge adapters.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the token to send as `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthenticated`] if no token exists
    /// - [`AuthError::SecretStore`] if the store cannot be read
    async fn bearer_token(&self) -> Result<String, AuthError>;

    /// Whether a token is available, without fetching it.
    fn is_authenticated(&self) -> bool;

    /// Host this provider authenticates for.
    fn host(&self) -> &str;
}

/// Provider holding a token supplied by the caller.
pub struct StaticTokenProvider {
    host: String,
    token: String,
}

impl StaticTokenProvider {
    /// Wrap a token. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] if the token is empty.
    pub fn new(host: impl Into<String>, token: impl AsRef<str>) -> Result<Self, AuthError> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken("token is empty".to_string()));
        }
        Ok(Self {
            host: host.into(),
            token: token.to_string(),
        })
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("host", &self.host)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn host(&self) -> &str {
        &self.host
    }
}

/// Provider that reads the token from a [`SecretStore`] on each request,
/// so `hubkit auth login` takes effect without restarting anything.
pub struct StoredTokenProvider {
    host: String,
    store: Box<dyn SecretStore>,
}

impl StoredTokenProvider {
    pub fn new(host: impl Into<String>, store: Box<dyn SecretStore>) -> Self {
        Self {
            host: host.into(),
            store,
        }
    }
}

impl fmt::Debug for StoredTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredTokenProvider")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for StoredTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        match self.store.get(GITHUB_TOKEN_KEY)? {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(AuthError::NotAuthenticated(self.host.clone())),
        }
    }

    fn is_authenticated(&self) -> bool {
        self.store.exists(GITHUB_TOKEN_KEY).unwrap_or(false)
    }

    fn host(&self) -> &str {
        &self.host
    }
}

/// Host part of an API base URL, used to label providers.
///
/// `https://api.github.com` yields `api.github.com`.
pub fn host_of(api_base: &str) -> &str {
    let rest = api_base
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(api_base);
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::FileSecretStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn static_provider_trims_and_returns_token() {
        let provider = StaticTokenProvider::new("api.github.com", "  ghp_abc \n").unwrap();
        assert_eq!(provider.bearer_token().await.unwrap(), "ghp_abc");
        assert!(provider.is_authenticated());
        assert_eq!(provider.host(), "api.github.com");
    }

    #[test]
    fn static_provider_rejects_empty() {
        assert!(matches!(
            StaticTokenProvider::new("h", "   "),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn debug_output_redacts_token() {
        let provider = StaticTokenProvider::new("h", "ghp_secret_value").unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("ghp_secret_value"));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn stored_provider_reads_store() {
        let temp = TempDir::new().unwrap();
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));
        store.set(GITHUB_TOKEN_KEY, "ghp_stored").unwrap();

        let provider = StoredTokenProvider::new("api.github.com", Box::new(store));
        assert!(provider.is_authenticated());
        assert_eq!(provider.bearer_token().await.unwrap(), "ghp_stored");
    }

    #[tokio::test]
    async fn stored_provider_without_token_is_not_authenticated() {
        let temp = TempDir::new().unwrap();
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));

        let provider = StoredTokenProvider::new("api.github.com", Box::new(store));
        assert!(!provider.is_authenticated());
        match provider.bearer_token().await {
            Err(AuthError::NotAuthenticated(host)) => assert_eq!(host, "api.github.com"),
            other => panic!("expected NotAuthenticated, got {:?}", other),
        }
    }

    #[test]
    fn host_of_strips_scheme_and_path() {
        assert_eq!(host_of("https://api.github.com"), "api.github.com");
        assert_eq!(
            host_of("https://ghe.example.com/api/v3"),
            "ghe.example.com"
        );
        assert_eq!(host_of("localhost:8080"), "localhost:8080");
    }
}
