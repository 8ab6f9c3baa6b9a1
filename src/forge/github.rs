//! forge::github
//!
//! GitHub forge implementation over the REST v3 API.
//!
//! # Design
//!
//! Every trait method is one request (or, for list endpoints, one request
//! per page). Responses deserialize into the shapes in [`super::schema`];
//! nothing here interprets them.
//!
//! # Authentication
//!
//! Tokens come from a [`TokenProvider`] and are fetched per request. A 401
//! triggers exactly one retry with a freshly fetched token, which picks up
//! a token stored by `hubkit auth login` in the meantime.
//!
//! # Rate Limiting
//!
//! - 429, and 403 with `X-RateLimit-Remaining: 0`, map to
//!   `ForgeError::RateLimited`
//! - No automatic backoff (caller's responsibility)
//!
//! # Pagination
//!
//! List endpoints request `per_page` items per page and follow pages until
//! a short page or `max_pages`, whichever comes first.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hubkit::auth::StaticTokenProvider;
//! use hubkit::forge::{Forge, ForgeConfig, GitHubForge};
//!
//! let provider = Arc::new(StaticTokenProvider::new("api.github.com", token)?);
//! let forge = GitHubForge::new(ForgeConfig::default(), provider)?;
//! let commit = forge.get_commit("octocat", "Hello-World", "7638417d...").await?;
//! ```
//!
//! [`TokenProvider`]: crate::auth::TokenProvider

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::schema::{
    ApiBranch, ApiContributor, ApiGitCommit, ApiInvitation, ApiIssue, ApiLanguages,
    ApiPullRequest, ApiReference, ApiRelease, ApiRepository, ApiTag, ApiUser, ListState,
    NewPullRequest, NewRepository,
};
use super::traits::{Forge, ForgeConfig, ForgeError};
use crate::auth::TokenProvider;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("hubkit/", env!("CARGO_PKG_VERSION"));

/// REST API version pinned on every request.
const API_VERSION: &str = "2022-11-28";

/// Largest page size GitHub honors.
const MAX_PER_PAGE: u32 = 100;

type Query<'a> = &'a [(&'a str, String)];

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client with the per-request timeout applied
    client: Client,
    /// Token source, consulted for every request
    token_provider: Arc<dyn TokenProvider>,
    /// Base URL, page size and page limit
    config: ForgeConfig,
    /// `config.api_base`, parsed
    base: Url,
}

// Custom Debug so nothing token-shaped is ever formatted
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("host", &self.token_provider.host())
            .field("api_base", &self.config.api_base)
            .field("per_page", &self.config.per_page)
            .field("max_pages", &self.config.max_pages)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge with explicit settings.
    ///
    /// A trailing `/` on `api_base` is dropped so loose references built by
    /// GitHub compare equal to the prefixes derived from it.
    ///
    /// # Errors
    ///
    /// `ForgeError::NetworkError` if the HTTP client cannot be built or
    /// `api_base` is not a base URL.
    pub fn new(
        config: ForgeConfig,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, ForgeError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ForgeError::NetworkError(format!("cannot build HTTP client: {}", e)))?;

        let config = ForgeConfig {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            ..config
        };
        let base = Url::parse(&config.api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                ForgeError::NetworkError(format!("invalid API base URL: {}", config.api_base))
            })?;

        Ok(Self {
            client,
            token_provider,
            config,
            base,
        })
    }

    /// Settings in effect.
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    async fn bearer_token(&self) -> Result<String, ForgeError> {
        self.token_provider
            .bearer_token()
            .await
            .map_err(|e| ForgeError::AuthFailed(e.to_string()))
    }

    /// Build common headers for API requests.
    async fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let token = self.bearer_token().await?;
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// URL for an API path given as segments.
    ///
    /// Each segment is percent-encoded on its own, so `/`, `#`, `%` and `?`
    /// inside a name never change which resource is addressed.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> String {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    /// URL for a repository endpoint.
    fn repo_url<'a>(
        &self,
        owner: &'a str,
        repo: &'a str,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> String {
        self.url(["repos", owner, repo].into_iter().chain(segments))
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: Query<'_>,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ForgeError> {
        let mut request = self
            .client
            .request(method, url)
            .headers(self.headers().await?)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ForgeError::NetworkError(format!("request to {} timed out", url))
            } else {
                ForgeError::NetworkError(e.to_string())
            }
        })
    }

    /// Send a request, retrying once with a fresh token on 401.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        query: Query<'_>,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ForgeError> {
        debug!(%method, url, "github request");
        let response = self.send(method.clone(), url, query, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        debug!(url, "401 from github, retrying once with a fresh token");
        self.send(method, url, query, body).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Query<'_>,
    ) -> Result<T, ForgeError> {
        let response = self.execute(Method::GET, url, query, None).await?;
        Self::handle_response(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: serde_json::Value,
    ) -> Result<T, ForgeError> {
        let response = self.execute(method, url, &[], Some(&body)).await?;
        Self::handle_response(response).await
    }

    /// Request whose response body is irrelevant (201/204 style endpoints).
    async fn send_empty(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), ForgeError> {
        let response = self.execute(method, url, &[], body.as_ref()).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Self::handle_error_response(response, status).await
        }
    }

    /// Fetch every page of a list endpoint, up to `max_pages`.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        extra_query: Query<'_>,
    ) -> Result<Vec<T>, ForgeError> {
        let per_page = self.config.per_page.clamp(1, MAX_PER_PAGE);
        let mut items: Vec<T> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query: Vec<(&str, String)> = extra_query.to_vec();
            query.push(("per_page", per_page.to_string()));
            query.push(("page", page.to_string()));

            let response = self.execute(Method::GET, url, &query, None).await?;
            // Contributors of an empty repository come back as 204
            if response.status() == StatusCode::NO_CONTENT {
                break;
            }
            let page_items: Vec<T> = Self::handle_response(response).await?;
            let page_count = page_items.len();
            items.extend(page_items);

            if page_count < per_page as usize {
                break;
            }
            if page >= self.config.max_pages {
                warn!(
                    url,
                    pages = page,
                    items = items.len(),
                    "stopped paginating at max_pages; results may be truncated"
                );
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            })
        } else {
            Self::handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        let headers = response.headers();
        let rate_limit_exhausted = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "0")
            .unwrap_or(false);
        let required_scopes = headers
            .get("X-Accepted-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limit_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("permission denied: {}", message);
                if let Some(scopes) = required_scopes {
                    err_msg.push_str(&format!(" [required scopes: {}]", scopes));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ForgeError> {
    serde_json::to_value(value).map_err(|e| ForgeError::ApiError {
        status: 0,
        message: format!("cannot encode request body: {}", e),
    })
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    fn api_base(&self) -> &str {
        &self.config.api_base
    }

    async fn get_user(&self, user: &str) -> Result<ApiUser, ForgeError> {
        self.get_json(&self.url(["users", user]), &[])
            .await
    }

    async fn get_user_by_id(&self, id: u64) -> Result<ApiUser, ForgeError> {
        self.get_json(&self.url(["user", id.to_string().as_str()]), &[]).await
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<ApiRepository>, ForgeError> {
        self.get_paginated(&self.url(["users", owner, "repos"]), &[])
            .await
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<ApiRepository, ForgeError> {
        self.get_json(&self.repo_url(owner, repo, std::iter::empty()), &[]).await
    }

    async fn list_languages(&self, owner: &str, repo: &str) -> Result<ApiLanguages, ForgeError> {
        self.get_json(&self.repo_url(owner, repo, ["languages"]), &[])
            .await
    }

    async fn create_repository(
        &self,
        request: NewRepository,
    ) -> Result<ApiRepository, ForgeError> {
        self.send_json(Method::POST, &self.url(["user", "repos"]), to_body(&request)?)
            .await
    }

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ApiContributor>, ForgeError> {
        self.get_paginated(&self.repo_url(owner, repo, ["contributors"]), &[])
            .await
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<ApiBranch>, ForgeError> {
        self.get_paginated(&self.repo_url(owner, repo, ["branches"]), &[])
            .await
    }

    async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<ApiBranch, ForgeError> {
        let segments = ["branches"].into_iter().chain(branch.split('/'));
        let url = self.repo_url(owner, repo, segments);
        self.get_json(&url, &[]).await
    }

    async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<ApiGitCommit, ForgeError> {
        let url = self.repo_url(owner, repo, ["git", "commits", sha]);
        self.get_json(&url, &[]).await
    }

    async fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<ApiTag>, ForgeError> {
        self.get_paginated(&self.repo_url(owner, repo, ["tags"]), &[])
            .await
    }

    async fn get_release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<ApiRelease>, ForgeError> {
        let segments = ["releases", "tags"].into_iter().chain(tag.split('/'));
        let url = self.repo_url(owner, repo, segments);
        match self.get_json(&url, &[]).await {
            Ok(release) => Ok(Some(release)),
            Err(ForgeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<ApiReference, ForgeError> {
        let segments = ["git", "ref"].into_iter().chain(ref_path.split('/'));
        let url = self.repo_url(owner, repo, segments);
        self.get_json(&url, &[]).await
    }

    async fn create_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_name: &str,
        sha: &str,
    ) -> Result<ApiReference, ForgeError> {
        let body = serde_json::json!({ "ref": ref_name, "sha": sha });
        self.send_json(Method::POST, &self.repo_url(owner, repo, ["git", "refs"]), body)
            .await
    }

    async fn delete_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<(), ForgeError> {
        let segments = ["git", "refs"].into_iter().chain(ref_path.split('/'));
        let url = self.repo_url(owner, repo, segments);
        self.send_empty(Method::DELETE, &url, None).await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<ApiPullRequest>, ForgeError> {
        let query = [("state", state.as_str().to_string())];
        self.get_paginated(&self.repo_url(owner, repo, ["pulls"]), &query)
            .await
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: NewPullRequest,
    ) -> Result<ApiPullRequest, ForgeError> {
        self.send_json(
            Method::POST,
            &self.repo_url(owner, repo, ["pulls"]),
            to_body(&request)?,
        )
        .await
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<ApiIssue>, ForgeError> {
        let query = [("state", state.as_str().to_string())];
        self.get_paginated(&self.repo_url(owner, repo, ["issues"]), &query)
            .await
    }

    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ForgeError> {
        let url = self.repo_url(owner, repo, ["collaborators", user]);
        self.send_empty(Method::PUT, &url, Some(serde_json::json!({ "permission": "push" })))
            .await
    }

    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ForgeError> {
        let url = self.repo_url(owner, repo, ["collaborators", user]);
        self.send_empty(Method::DELETE, &url, None).await
    }

    async fn list_invitations(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ApiInvitation>, ForgeError> {
        self.get_paginated(&self.repo_url(owner, repo, ["invitations"]), &[])
            .await
    }

    async fn delete_invitation(
        &self,
        owner: &str,
        repo: &str,
        id: u64,
    ) -> Result<(), ForgeError> {
        let url = self.repo_url(owner, repo, ["invitations", id.to_string().as_str()]);
        self.send_empty(Method::DELETE, &url, None).await
    }
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}
