//! forge::schema
//!
//! Provider-native request and response shapes.
//!
//! These mirror the GitHub REST v3 JSON schema closely enough for serde to
//! deserialize them; fields the provider may omit or null out are `Option`
//! and are defaulted by the domain mapper, never unwrapped here. Unknown
//! fields are ignored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account as returned by `GET /users/{user}` and `GET /user/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub following: Option<u64>,
}

/// Repository owner summary embedded in repository payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiOwner {
    pub login: String,
}

/// Repository as returned by the repository endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRepository {
    pub name: String,
    #[serde(default)]
    pub owner: Option<ApiOwner>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub stargazers_count: Option<u64>,
    #[serde(default)]
    pub forks_count: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Language name to byte count, from `GET /repos/{o}/{r}/languages`.
pub type ApiLanguages = HashMap<String, u64>;

/// Abbreviated commit pointer embedded in branch and tag listings and in
/// parent lists. Carries no message or author: it has to be resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiCommitPointer {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Branch entry from `GET /repos/{o}/{r}/branches[/{branch}]`.
///
/// `commit.url` points at the `commits/{sha}` endpoint family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiBranch {
    pub name: String,
    pub commit: ApiCommitPointer,
    #[serde(default)]
    pub protected: Option<bool>,
}

/// Author or committer signature on a git commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Full commit from `GET /repos/{o}/{r}/git/commits/{sha}`.
///
/// Parent URLs point at the `git/commits/{sha}` endpoint family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGitCommit {
    pub sha: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<ApiSignature>,
    #[serde(default)]
    pub committer: Option<ApiSignature>,
    #[serde(default)]
    pub parents: Vec<ApiCommitPointer>,
}

/// Tag entry from `GET /repos/{o}/{r}/tags`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiTag {
    pub name: String,
    pub commit: ApiCommitPointer,
    #[serde(default)]
    pub zipball_url: Option<String>,
    #[serde(default)]
    pub tarball_url: Option<String>,
}

/// Release from `GET /repos/{o}/{r}/releases/tags/{tag}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Head or base of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiPullRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: Option<String>,
}

/// Pull request from `GET|POST /repos/{o}/{r}/pulls`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiPullRequest {
    pub id: u64,
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub html_url: Option<String>,
    pub head: ApiPullRef,
    pub base: ApiPullRef,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Pull request links attached to issues that are pull requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiIssuePullLinks {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Issue from `GET /repos/{o}/{r}/issues`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiIssue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub pull_request: Option<ApiIssuePullLinks>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Contributor from `GET /repos/{o}/{r}/contributors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiContributor {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub contributions: Option<u64>,
}

/// Object a git reference points at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRefObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Reference from `GET|POST /repos/{o}/{r}/git/refs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiReference {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub object: ApiRefObject,
}

/// Pending collaborator invitation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiInvitation {
    pub id: u64,
    #[serde(default)]
    pub invitee: Option<ApiOwner>,
    #[serde(default)]
    pub permissions: Option<String>,
}

/// State filter accepted by the pull request and issue list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListState {
    Open,
    Closed,
    #[default]
    All,
}

impl ListState {
    /// Query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListState::Open => "open",
            ListState::Closed => "closed",
            ListState::All => "all",
        }
    }

    /// Whether an item in `state` passes this filter.
    pub fn matches(&self, state: &str) -> bool {
        match self {
            ListState::All => true,
            _ => self.as_str() == state,
        }
    }
}

impl std::fmt::Display for ListState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(ListState::Open),
            "closed" => Ok(ListState::Closed),
            "all" => Ok(ListState::All),
            other => Err(format!(
                "unknown state '{}', expected open, closed or all",
                other
            )),
        }
    }
}

/// Request body for `POST /repos/{o}/{r}/pulls`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    /// Branch with the changes
    pub head: String,
    /// Branch to merge into
    pub base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Request body for `POST /user/repos`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRepository {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_commit_deserializes_from_provider_json() {
        let json = r#"{
            "sha": "7638417db6d59f3c431d3e1f261cc637155684cd",
            "url": "https://api.github.com/repos/octocat/Hello-World/git/commits/7638417db6d59f3c431d3e1f261cc637155684cd",
            "author": {"name": "Monalisa", "email": "m@example.com", "date": "2014-11-07T22:01:45Z"},
            "message": "added readme",
            "tree": {"sha": "691272480426f78a0138979dd3ce63b77f706feb"},
            "parents": [
                {
                    "url": "https://api.github.com/repos/octocat/Hello-World/git/commits/1acc419d4d6a9ce985db7be48c6349a0475975b5",
                    "sha": "1acc419d4d6a9ce985db7be48c6349a0475975b5",
                    "html_url": "https://github.com/octocat/Hello-World/commit/1acc419d4d6a9ce985db7be48c6349a0475975b5"
                }
            ]
        }"#;

        let commit: ApiGitCommit = serde_json::from_str(json).unwrap();
        assert_eq!(commit.message.as_deref(), Some("added readme"));
        assert_eq!(commit.parents.len(), 1);
        assert!(commit.parents[0]
            .url
            .as_deref()
            .unwrap()
            .contains("/git/commits/"));
        assert!(commit.author.unwrap().date.is_some());
    }

    #[test]
    fn nullable_fields_default() {
        let repo: ApiRepository =
            serde_json::from_str(r#"{"name": "x", "description": null}"#).unwrap();
        assert_eq!(repo.name, "x");
        assert!(repo.description.is_none());
        assert!(repo.updated_at.is_none());
    }

    #[test]
    fn list_state_parse_and_match() {
        assert_eq!("OPEN".parse::<ListState>().unwrap(), ListState::Open);
        assert!("merged".parse::<ListState>().is_err());
        assert!(ListState::All.matches("closed"));
        assert!(ListState::Closed.matches("closed"));
        assert!(!ListState::Open.matches("closed"));
        assert_eq!(ListState::default().to_string(), "all");
    }

    #[test]
    fn new_pull_request_omits_missing_body() {
        let body = NewPullRequest {
            title: "t".into(),
            head: "feature".into(),
            base: "main".into(),
            body: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("body").is_none());
        assert_eq!(json["head"], "feature");
    }
}
