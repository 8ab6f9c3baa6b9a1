//! forge::traits
//!
//! Forge trait definition for talking to the hosting provider.
//!
//! # Design
//!
//! The `Forge` trait is async because every method is one network round
//! trip (list methods: a bounded number of pages). It has no branching
//! logic of its own; each method returns the provider-native shape from
//! [`super::schema`] or a [`ForgeError`].
//!
//! # Example
//!
//! ```ignore
//! use hubkit::forge::{Forge, ForgeError};
//!
//! async fn tip(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let branch = forge.get_branch("octocat", "hello-world", "main").await?;
//!     println!("{} -> {:?}", branch.name, branch.commit.sha);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::schema::{
    ApiBranch, ApiContributor, ApiGitCommit, ApiInvitation, ApiIssue, ApiLanguages,
    ApiPullRequest, ApiReference, ApiRelease, ApiRepository, ApiTag, ApiUser, ListState,
    NewPullRequest, NewRepository,
};

/// Errors from forge operations.
///
/// These map the common failure modes of a hosting provider's API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error (including per-request timeouts).
    #[error("network error: {0}")]
    NetworkError(String),

    /// The operation is not supported by this forge.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl ForgeError {
    /// Whether this error means the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }
}

/// Adapter settings, passed explicitly to the forge constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeConfig {
    /// REST API base URL without trailing slash
    pub api_base: String,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
    /// Page size for list endpoints
    pub per_page: u32,
    /// Upper bound on pages fetched by one list call
    pub max_pages: u32,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_base: super::github::DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            per_page: 100,
            max_pages: 10,
        }
    }
}

/// The Forge trait for interacting with a repository hosting provider.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: credentials missing or rejected
/// - `NotFound`: resource doesn't exist
/// - `RateLimited`: back off and retry later
/// - `ApiError`: display the provider's message
/// - `NetworkError`: check connectivity
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Base URL that loose references returned by this forge are rooted at.
    fn api_base(&self) -> &str;

    // --- users -------------------------------------------------------------

    /// `GET /users/{user}`.
    async fn get_user(&self, user: &str) -> Result<ApiUser, ForgeError>;

    /// `GET /user/{id}`.
    async fn get_user_by_id(&self, id: u64) -> Result<ApiUser, ForgeError>;

    // --- repositories ------------------------------------------------------

    /// `GET /users/{owner}/repos`.
    async fn list_repositories(&self, owner: &str) -> Result<Vec<ApiRepository>, ForgeError>;

    /// `GET /repos/{owner}/{repo}`.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<ApiRepository, ForgeError>;

    /// `GET /repos/{owner}/{repo}/languages`.
    async fn list_languages(&self, owner: &str, repo: &str) -> Result<ApiLanguages, ForgeError>;

    /// `POST /user/repos` (repository owned by the authenticated user).
    async fn create_repository(&self, request: NewRepository)
        -> Result<ApiRepository, ForgeError>;

    /// `GET /repos/{owner}/{repo}/contributors`.
    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ApiContributor>, ForgeError>;

    // --- branches, commits, tags -------------------------------------------

    /// `GET /repos/{owner}/{repo}/branches`.
    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<ApiBranch>, ForgeError>;

    /// `GET /repos/{owner}/{repo}/branches/{branch}`.
    async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<ApiBranch, ForgeError>;

    /// `GET /repos/{owner}/{repo}/git/commits/{sha}`.
    async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<ApiGitCommit, ForgeError>;

    /// `GET /repos/{owner}/{repo}/tags`.
    async fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<ApiTag>, ForgeError>;

    /// `GET /repos/{owner}/{repo}/releases/tags/{tag}`.
    ///
    /// A tag without a release is `Ok(None)`, not an error.
    async fn get_release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<ApiRelease>, ForgeError>;

    // --- references --------------------------------------------------------

    /// `GET /repos/{owner}/{repo}/git/ref/{ref}` where `ref` omits `refs/`.
    async fn get_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<ApiReference, ForgeError>;

    /// `POST /repos/{owner}/{repo}/git/refs` with a fully qualified ref name.
    async fn create_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_name: &str,
        sha: &str,
    ) -> Result<ApiReference, ForgeError>;

    /// `DELETE /repos/{owner}/{repo}/git/refs/{ref}` where `ref` omits `refs/`.
    async fn delete_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<(), ForgeError>;

    // --- pull requests and issues ------------------------------------------

    /// `GET /repos/{owner}/{repo}/pulls?state=`.
    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<ApiPullRequest>, ForgeError>;

    /// `POST /repos/{owner}/{repo}/pulls`.
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: NewPullRequest,
    ) -> Result<ApiPullRequest, ForgeError>;

    /// `GET /repos/{owner}/{repo}/issues?state=`.
    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<ApiIssue>, ForgeError>;

    // --- access ------------------------------------------------------------

    /// `PUT /repos/{owner}/{repo}/collaborators/{user}`.
    async fn add_collaborator(&self, owner: &str, repo: &str, user: &str)
        -> Result<(), ForgeError>;

    /// `DELETE /repos/{owner}/{repo}/collaborators/{user}`.
    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ForgeError>;

    /// `GET /repos/{owner}/{repo}/invitations`.
    async fn list_invitations(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ApiInvitation>, ForgeError>;

    /// `DELETE /repos/{owner}/{repo}/invitations/{id}`.
    async fn delete_invitation(&self, owner: &str, repo: &str, id: u64)
        -> Result<(), ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("branch main".into())),
            "not found: branch main"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 422,
                    message: "Reference already exists".into()
                }
            ),
            "API error: 422 - Reference already exists"
        );
        assert_eq!(
            format!("{}", ForgeError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
    }

    #[test]
    fn not_found_predicate() {
        assert!(ForgeError::NotFound("x".into()).is_not_found());
        assert!(!ForgeError::RateLimited.is_not_found());
    }

    #[test]
    fn default_config_targets_public_github() {
        let config = ForgeConfig::default();
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.per_page, 100);
        assert!(config.max_pages > 0);
    }
}
