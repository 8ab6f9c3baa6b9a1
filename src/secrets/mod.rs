//! secrets
//!
//! Credential storage.
//!
//! The only provider is [`FileSecretStore`], a TOML file at
//! `~/.hubkit/secrets.toml` written atomically with 0600 permissions on
//! Unix. Use [`create_store`] with the provider name from configuration.
//!
//! ```ignore
//! use hubkit::secrets::{create_store, GITHUB_TOKEN_KEY};
//!
//! let store = create_store("file")?;
//! store.set(GITHUB_TOKEN_KEY, "ghp_...")?;
//! ```

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Key under which the GitHub token is stored.
pub const GITHUB_TOKEN_KEY: &str = "github.pat";

/// Create a secret store for the named provider.
///
/// # Errors
///
/// `ProviderNotAvailable` for unknown providers, or the store's own
/// initialization error.
pub fn create_store(provider: &str) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        DEFAULT_PROVIDER => Ok(Box::new(FileSecretStore::new()?)),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file)",
            other
        ))),
    }
}
