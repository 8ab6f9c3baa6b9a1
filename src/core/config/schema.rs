//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$HUBKIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/hubkit/config.toml`
//! 3. `~/.hubkit/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Values are validated after parsing so a typo in a numeric limit is
//! reported at load time rather than as a confusing request failure.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// api_base = "https://api.github.com"
/// default_owner = "octocat"
///
/// [http]
/// request_timeout_secs = 30
/// per_page = 100
/// max_pages = 10
///
/// [walk]
/// max_depth = 10000
/// max_commits = 50000
/// deadline_secs = 300
/// dedupe = false
///
/// [secrets]
/// provider = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// REST API base URL (GitHub Enterprise: `https://host/api/v3`)
    pub api_base: Option<String>,

    /// Owner used when a command omits one
    pub default_owner: Option<String>,

    /// HTTP client settings
    pub http: Option<HttpConfig>,

    /// Ancestry walk limits
    pub walk: Option<WalkConfig>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api_base) = &self.api_base {
            if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base '{}' must be an http(s) URL",
                    api_base
                )));
            }
        }

        if let Some(owner) = &self.default_owner {
            if owner.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_owner cannot be empty".to_string(),
                ));
            }
        }

        if let Some(http) = &self.http {
            http.validate()?;
        }
        if let Some(walk) = &self.walk {
            walk.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }

        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,

    /// Page size for list endpoints (GitHub caps this at 100)
    pub per_page: Option<u32>,

    /// Upper bound on pages fetched by one list call
    pub max_pages: Option<u32>,
}

impl HttpConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "http.request_timeout_secs must be positive".to_string(),
            ));
        }
        if let Some(per_page) = self.per_page {
            if !(1..=100).contains(&per_page) {
                return Err(ConfigError::InvalidValue(format!(
                    "http.per_page must be between 1 and 100, got {}",
                    per_page
                )));
            }
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::InvalidValue(
                "http.max_pages must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ancestry walk limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WalkConfig {
    /// Deepest parent chain followed before failing
    pub max_depth: Option<usize>,

    /// Longest result list produced before failing
    pub max_commits: Option<usize>,

    /// Overall walk deadline in seconds
    pub deadline_secs: Option<u64>,

    /// Emit each commit once even when reachable through several merges
    pub dedupe: Option<bool>,
}

impl WalkConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue(
                "walk.max_depth must be positive".to_string(),
            ));
        }
        if self.max_commits == Some(0) {
            return Err(ConfigError::InvalidValue(
                "walk.max_commits must be positive".to_string(),
            ));
        }
        if self.deadline_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "walk.deadline_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: GlobalConfig = toml::from_str(
            r#"
            api_base = "https://github.example.com/api/v3"
            default_owner = "octocat"

            [http]
            request_timeout_secs = 10
            per_page = 50
            max_pages = 3

            [walk]
            max_depth = 500
            max_commits = 2000
            deadline_secs = 60
            dedupe = true

            [secrets]
            provider = "file"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.http.as_ref().unwrap().per_page, Some(50));
        assert_eq!(config.walk.as_ref().unwrap().dedupe, Some(true));
    }

    #[test]
    fn empty_config_is_valid() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config, GlobalConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_api_base() {
        let config = GlobalConfig {
            api_base: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_per_page() {
        let config = GlobalConfig {
            http: Some(HttpConfig {
                per_page: Some(500),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_walk_limits() {
        for walk in [
            WalkConfig {
                max_depth: Some(0),
                ..Default::default()
            },
            WalkConfig {
                max_commits: Some(0),
                ..Default::default()
            },
            WalkConfig {
                deadline_secs: Some(0),
                ..Default::default()
            },
        ] {
            let config = GlobalConfig {
                walk: Some(walk),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn rejects_unknown_secrets_provider() {
        let secrets = SecretsConfig {
            provider: Some("vault".to_string()),
        };
        assert!(secrets.validate().is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<GlobalConfig, _> = toml::from_str("colour = \"blue\"");
        assert!(result.is_err());
    }
}
