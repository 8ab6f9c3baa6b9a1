//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge serves repositories, commits, branches, tags, pull
//! requests and issues from memory. Repositories are keyed by
//! `owner/repo`. Branch, tag and parent pointers are given the same loose
//! URL shapes GitHub uses, rooted at the mock's `api_base`, so code that
//! resolves them behaves exactly as it would against the real API.
//!
//! Failures are injected with [`FailOn`]; every call is recorded as a
//! [`MockOperation`].
//!
//! # Example
//!
//! ```
//! use hubkit::forge::mock::MockForge;
//! use hubkit::forge::Forge;
//!
//! # tokio_test::block_on(async {
//! let a = "a".repeat(40);
//! let b = "b".repeat(40);
//! let forge = MockForge::new()
//!     .with_commit("octocat", "demo", &a, "root", "2024-01-01T00:00:00Z", &[])
//!     .with_commit("octocat", "demo", &b, "second", "2024-01-02T00:00:00Z", &[&a])
//!     .with_branch("octocat", "demo", "main", &b);
//!
//! let branch = forge.get_branch("octocat", "demo", "main").await.unwrap();
//! assert!(branch.commit.url.unwrap().ends_with(&format!("/commits/{}", b)));
//!
//! let commit = forge.get_commit("octocat", "demo", &b).await.unwrap();
//! assert_eq!(commit.parents.len(), 1);
//! # });
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::github::DEFAULT_API_BASE;
use super::schema::{
    ApiBranch, ApiCommitPointer, ApiContributor, ApiGitCommit, ApiInvitation, ApiIssue,
    ApiLanguages, ApiOwner, ApiPullRef, ApiPullRequest, ApiRefObject, ApiReference, ApiRelease,
    ApiRepository, ApiSignature, ApiTag, ApiUser, ListState, NewPullRequest, NewRepository,
};
use super::traits::{Forge, ForgeError};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
    api_base: String,
}

#[derive(Debug, Default)]
struct MockRepo {
    repository: ApiRepository,
    languages: ApiLanguages,
    commits: HashMap<String, ApiGitCommit>,
    branches: Vec<ApiBranch>,
    tags: Vec<ApiTag>,
    releases: HashMap<String, ApiRelease>,
    pulls: Vec<ApiPullRequest>,
    issues: Vec<ApiIssue>,
    contributors: Vec<ApiContributor>,
    collaborators: BTreeSet<String>,
    invitations: Vec<ApiInvitation>,
}

#[derive(Debug)]
struct MockForgeInner {
    authenticated_user: String,
    users: Vec<ApiUser>,
    repos: HashMap<String, MockRepo>,
    next_id: u64,
    commit_delay: Option<Duration>,
    fail_on: Vec<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetUser(ForgeError),
    ListRepositories(ForgeError),
    GetRepository(ForgeError),
    ListLanguages(ForgeError),
    CreateRepository(ForgeError),
    ListContributors(ForgeError),
    ListBranches(ForgeError),
    GetBranch(ForgeError),
    /// Fail every `get_commit` call.
    GetCommit(ForgeError),
    /// Fail `get_commit` only for this hash.
    GetCommitSha { sha: String, error: ForgeError },
    ListTags(ForgeError),
    GetReleaseByTag(ForgeError),
    CreateReference(ForgeError),
    DeleteReference(ForgeError),
    ListPullRequests(ForgeError),
    CreatePullRequest(ForgeError),
    ListIssues(ForgeError),
    AddCollaborator(ForgeError),
    RemoveCollaborator(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetUser { user: String },
    GetUserById { id: u64 },
    ListRepositories { owner: String },
    GetRepository { repo: String },
    ListLanguages { repo: String },
    CreateRepository { name: String, private: bool },
    ListContributors { repo: String },
    ListBranches { repo: String },
    GetBranch { repo: String, branch: String },
    GetCommit { repo: String, sha: String },
    ListTags { repo: String },
    GetReleaseByTag { repo: String, tag: String },
    GetReference { repo: String, ref_path: String },
    CreateReference { repo: String, ref_name: String, sha: String },
    DeleteReference { repo: String, ref_path: String },
    ListPullRequests { repo: String, state: String },
    CreatePullRequest { repo: String, head: String, base: String },
    ListIssues { repo: String, state: String },
    AddCollaborator { repo: String, user: String },
    RemoveCollaborator { repo: String, user: String },
    ListInvitations { repo: String },
    DeleteInvitation { repo: String, id: u64 },
}

fn slug(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner, repo)
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn not_found(what: impl std::fmt::Display) -> ForgeError {
    ForgeError::NotFound(format!("{} not found", what))
}

impl MockForge {
    /// Create a new empty mock forge rooted at the public GitHub API.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                authenticated_user: "octocat".to_string(),
                users: Vec::new(),
                repos: HashMap::new(),
                next_id: 1,
                commit_delay: None,
                fail_on: Vec::new(),
                operations: Vec::new(),
            })),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Root loose references at a different base (call before adding data).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Login that owns repositories created through the mock.
    pub fn with_authenticated_user(self, login: &str) -> Self {
        self.inner.lock().unwrap().authenticated_user = login.to_string();
        self
    }

    /// Sleep this long inside every `get_commit`, for deadline tests.
    pub fn with_commit_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().commit_delay = Some(delay);
        self
    }

    pub fn with_user(self, user: ApiUser) -> Self {
        self.inner.lock().unwrap().users.push(user);
        self
    }

    /// Add a repository owned by `owner`.
    pub fn with_repository(self, owner: &str, repository: ApiRepository) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let repository = ApiRepository {
                owner: Some(ApiOwner {
                    login: owner.to_string(),
                }),
                ..repository
            };
            let key = slug(owner, &repository.name);
            inner.repos.entry(key).or_default().repository = repository;
        }
        self
    }

    pub fn with_languages(self, owner: &str, repo: &str, languages: &[(&str, u64)]) -> Self {
        self.with_repo(owner, repo, |r, _| {
            r.languages = languages
                .iter()
                .map(|(name, bytes)| (name.to_string(), *bytes))
                .collect();
        })
    }

    /// Add a commit whose parent pointers use the `git/commits/` shape.
    ///
    /// `date` is RFC 3339.
    pub fn with_commit(
        self,
        owner: &str,
        repo: &str,
        sha: &str,
        message: &str,
        date: &str,
        parents: &[&str],
    ) -> Self {
        self.with_repo(owner, repo, |r, api_base| {
            let git_commits = format!("{}/repos/{}/{}/git/commits/", api_base, owner, repo);
            let commit = ApiGitCommit {
                sha: sha.to_string(),
                url: Some(format!("{}{}", git_commits, sha)),
                message: Some(message.to_string()),
                author: Some(ApiSignature {
                    name: Some("Mona Lisa".to_string()),
                    email: Some("mona@example.com".to_string()),
                    date: Some(parse_time(date)),
                }),
                committer: None,
                parents: parents
                    .iter()
                    .map(|p| ApiCommitPointer {
                        sha: Some(p.to_string()),
                        url: Some(format!("{}{}", git_commits, p)),
                    })
                    .collect(),
            };
            r.commits.insert(sha.to_string(), commit);
        })
    }

    /// Add a commit verbatim, for malformed-payload scenarios.
    pub fn with_raw_commit(self, owner: &str, repo: &str, commit: ApiGitCommit) -> Self {
        self.with_repo(owner, repo, |r, _| {
            r.commits.insert(commit.sha.clone(), commit);
        })
    }

    /// Add a branch whose tip pointer uses the `commits/` shape.
    pub fn with_branch(self, owner: &str, repo: &str, name: &str, tip: &str) -> Self {
        self.with_repo(owner, repo, |r, api_base| {
            r.branches.push(branch_entry(api_base, owner, repo, name, tip));
        })
    }

    pub fn with_tag(self, owner: &str, repo: &str, name: &str, sha: &str) -> Self {
        self.with_repo(owner, repo, |r, api_base| {
            r.tags.push(tag_entry(api_base, owner, repo, name, sha));
        })
    }

    pub fn with_release(self, owner: &str, repo: &str, release: ApiRelease) -> Self {
        self.with_repo(owner, repo, |r, _| {
            r.releases.insert(release.tag_name.clone(), release);
        })
    }

    pub fn with_pull_request(self, owner: &str, repo: &str, pull: ApiPullRequest) -> Self {
        self.with_repo(owner, repo, |r, _| r.pulls.push(pull))
    }

    pub fn with_issue(self, owner: &str, repo: &str, issue: ApiIssue) -> Self {
        self.with_repo(owner, repo, |r, _| r.issues.push(issue))
    }

    pub fn with_contributor(self, owner: &str, repo: &str, contributor: ApiContributor) -> Self {
        self.with_repo(owner, repo, |r, _| r.contributors.push(contributor))
    }

    pub fn with_invitation(self, owner: &str, repo: &str, invitation: ApiInvitation) -> Self {
        self.with_repo(owner, repo, |r, _| r.invitations.push(invitation))
    }

    /// Configure the mock to fail on a specific operation. Rules accumulate.
    ///
    /// ```
    /// use hubkit::forge::mock::{MockForge, FailOn};
    /// use hubkit::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::ListBranches(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on.push(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    /// How many times `get_commit` was called for `sha`.
    pub fn commit_fetches(&self, sha: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::GetCommit { sha: s, .. } if s == sha))
            .count()
    }

    /// Branch names currently present (for test verification).
    pub fn branch_names(&self, owner: &str, repo: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .repos
            .get(&slug(owner, repo))
            .map(|r| r.branches.iter().map(|b| b.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Tag names currently present (for test verification).
    pub fn tag_names(&self, owner: &str, repo: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .repos
            .get(&slug(owner, repo))
            .map(|r| r.tags.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Collaborators currently granted access (for test verification).
    pub fn collaborators(&self, owner: &str, repo: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .repos
            .get(&slug(owner, repo))
            .map(|r| r.collaborators.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn with_repo(self, owner: &str, repo: &str, f: impl FnOnce(&mut MockRepo, &str)) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let api_base = self.api_base.clone();
            let entry = inner.repos.entry(slug(owner, repo)).or_insert_with(|| MockRepo {
                repository: ApiRepository {
                    name: repo.to_string(),
                    owner: Some(ApiOwner {
                        login: owner.to_string(),
                    }),
                    ..Default::default()
                },
                ..Default::default()
            });
            f(entry, &api_base);
        }
        self
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    /// Return the configured error for this operation, if any.
    fn check_fail(
        &self,
        matches: impl Fn(&FailOn) -> Option<ForgeError>,
    ) -> Result<(), ForgeError> {
        let inner = self.inner.lock().unwrap();
        match inner.fail_on.iter().find_map(matches) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn read_repo<T>(
        &self,
        owner: &str,
        repo: &str,
        f: impl FnOnce(&MockRepo, &str) -> Result<T, ForgeError>,
    ) -> Result<T, ForgeError> {
        let inner = self.inner.lock().unwrap();
        let key = slug(owner, repo);
        let entry = inner
            .repos
            .get(&key)
            .ok_or_else(|| not_found(format!("repository {}", key)))?;
        f(entry, &self.api_base)
    }

    fn write_repo<T>(
        &self,
        owner: &str,
        repo: &str,
        f: impl FnOnce(&mut MockRepo, &str) -> Result<T, ForgeError>,
    ) -> Result<T, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        let api_base = self.api_base.clone();
        let key = slug(owner, repo);
        let entry = inner
            .repos
            .get_mut(&key)
            .ok_or_else(|| not_found(format!("repository {}", key)))?;
        f(entry, &api_base)
    }

    fn next_id(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        id
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

fn branch_entry(api_base: &str, owner: &str, repo: &str, name: &str, tip: &str) -> ApiBranch {
    ApiBranch {
        name: name.to_string(),
        commit: ApiCommitPointer {
            sha: Some(tip.to_string()),
            url: Some(format!("{}/repos/{}/{}/commits/{}", api_base, owner, repo, tip)),
        },
        protected: Some(false),
    }
}

fn tag_entry(api_base: &str, owner: &str, repo: &str, name: &str, sha: &str) -> ApiTag {
    ApiTag {
        name: name.to_string(),
        commit: ApiCommitPointer {
            sha: Some(sha.to_string()),
            url: Some(format!("{}/repos/{}/{}/commits/{}", api_base, owner, repo, sha)),
        },
        zipball_url: Some(format!("{}/repos/{}/{}/zipball/{}", api_base, owner, repo, name)),
        tarball_url: Some(format!("{}/repos/{}/{}/tarball/{}", api_base, owner, repo, name)),
    }
}

fn reference(api_base: &str, owner: &str, repo: &str, ref_name: &str, sha: &str) -> ApiReference {
    ApiReference {
        ref_name: ref_name.to_string(),
        object: ApiRefObject {
            sha: sha.to_string(),
            kind: Some("commit".to_string()),
            url: Some(format!("{}/repos/{}/{}/git/commits/{}", api_base, owner, repo, sha)),
        },
    }
}

fn already_exists(what: &str) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: format!("{} already exists", what),
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_user(&self, user: &str) -> Result<ApiUser, ForgeError> {
        self.record(MockOperation::GetUser {
            user: user.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::GetUser(e) => Some(e.clone()),
            _ => None,
        })?;
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.login == user)
            .cloned()
            .ok_or_else(|| not_found(format!("user {}", user)))
    }

    async fn get_user_by_id(&self, id: u64) -> Result<ApiUser, ForgeError> {
        self.record(MockOperation::GetUserById { id });
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| not_found(format!("user id {}", id)))
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<ApiRepository>, ForgeError> {
        self.record(MockOperation::ListRepositories {
            owner: owner.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::ListRepositories(e) => Some(e.clone()),
            _ => None,
        })?;
        let inner = self.inner.lock().unwrap();
        let prefix = format!("{}/", owner);
        let mut repos: Vec<ApiRepository> = inner
            .repos
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, r)| r.repository.clone())
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<ApiRepository, ForgeError> {
        self.record(MockOperation::GetRepository {
            repo: slug(owner, repo),
        });
        self.check_fail(|f| match f {
            FailOn::GetRepository(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| Ok(r.repository.clone()))
    }

    async fn list_languages(&self, owner: &str, repo: &str) -> Result<ApiLanguages, ForgeError> {
        self.record(MockOperation::ListLanguages {
            repo: slug(owner, repo),
        });
        self.check_fail(|f| match f {
            FailOn::ListLanguages(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| Ok(r.languages.clone()))
    }

    async fn create_repository(
        &self,
        request: NewRepository,
    ) -> Result<ApiRepository, ForgeError> {
        self.record(MockOperation::CreateRepository {
            name: request.name.clone(),
            private: request.private,
        });
        self.check_fail(|f| match f {
            FailOn::CreateRepository(e) => Some(e.clone()),
            _ => None,
        })?;

        let mut inner = self.inner.lock().unwrap();
        let owner = inner.authenticated_user.clone();
        let key = slug(&owner, &request.name);
        if inner.repos.contains_key(&key) {
            return Err(already_exists("name"));
        }
        let repository = ApiRepository {
            name: request.name.clone(),
            owner: Some(ApiOwner {
                login: owner.clone(),
            }),
            description: request.description,
            html_url: Some(format!("https://github.com/{}", key)),
            private: Some(request.private),
            stargazers_count: Some(0),
            forks_count: Some(0),
            updated_at: Some(Utc::now()),
        };
        inner.repos.insert(
            key,
            MockRepo {
                repository: repository.clone(),
                ..Default::default()
            },
        );
        Ok(repository)
    }

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ApiContributor>, ForgeError> {
        self.record(MockOperation::ListContributors {
            repo: slug(owner, repo),
        });
        self.check_fail(|f| match f {
            FailOn::ListContributors(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| Ok(r.contributors.clone()))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<ApiBranch>, ForgeError> {
        self.record(MockOperation::ListBranches {
            repo: slug(owner, repo),
        });
        self.check_fail(|f| match f {
            FailOn::ListBranches(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| Ok(r.branches.clone()))
    }

    async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<ApiBranch, ForgeError> {
        self.record(MockOperation::GetBranch {
            repo: slug(owner, repo),
            branch: branch.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::GetBranch(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| {
            r.branches
                .iter()
                .find(|b| b.name == branch)
                .cloned()
                .ok_or_else(|| not_found(format!("branch {}", branch)))
        })
    }

    async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<ApiGitCommit, ForgeError> {
        self.record(MockOperation::GetCommit {
            repo: slug(owner, repo),
            sha: sha.to_string(),
        });
        let delay = self.inner.lock().unwrap().commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_fail(|f| match f {
            FailOn::GetCommit(e) => Some(e.clone()),
            FailOn::GetCommitSha { sha: s, error } if s == sha => Some(error.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| {
            r.commits
                .get(sha)
                .cloned()
                .ok_or_else(|| not_found(format!("commit {}", sha)))
        })
    }

    async fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<ApiTag>, ForgeError> {
        self.record(MockOperation::ListTags {
            repo: slug(owner, repo),
        });
        self.check_fail(|f| match f {
            FailOn::ListTags(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| Ok(r.tags.clone()))
    }

    async fn get_release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<ApiRelease>, ForgeError> {
        self.record(MockOperation::GetReleaseByTag {
            repo: slug(owner, repo),
            tag: tag.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::GetReleaseByTag(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| Ok(r.releases.get(tag).cloned()))
    }

    async fn get_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<ApiReference, ForgeError> {
        self.record(MockOperation::GetReference {
            repo: slug(owner, repo),
            ref_path: ref_path.to_string(),
        });
        self.read_repo(owner, repo, |r, api_base| {
            let sha = if let Some(name) = ref_path.strip_prefix("heads/") {
                r.branches
                    .iter()
                    .find(|b| b.name == name)
                    .and_then(|b| b.commit.sha.clone())
            } else if let Some(name) = ref_path.strip_prefix("tags/") {
                r.tags
                    .iter()
                    .find(|t| t.name == name)
                    .and_then(|t| t.commit.sha.clone())
            } else {
                None
            };
            sha.map(|sha| reference(api_base, owner, repo, &format!("refs/{}", ref_path), &sha))
                .ok_or_else(|| not_found(format!("reference {}", ref_path)))
        })
    }

    async fn create_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_name: &str,
        sha: &str,
    ) -> Result<ApiReference, ForgeError> {
        self.record(MockOperation::CreateReference {
            repo: slug(owner, repo),
            ref_name: ref_name.to_string(),
            sha: sha.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::CreateReference(e) => Some(e.clone()),
            _ => None,
        })?;
        self.write_repo(owner, repo, |r, api_base| {
            if let Some(name) = ref_name.strip_prefix("refs/heads/") {
                if r.branches.iter().any(|b| b.name == name) {
                    return Err(already_exists("Reference"));
                }
                r.branches.push(branch_entry(api_base, owner, repo, name, sha));
            } else if let Some(name) = ref_name.strip_prefix("refs/tags/") {
                if r.tags.iter().any(|t| t.name == name) {
                    return Err(already_exists("Reference"));
                }
                r.tags.push(tag_entry(api_base, owner, repo, name, sha));
            } else {
                return Err(ForgeError::ApiError {
                    status: 422,
                    message: format!("unsupported reference {}", ref_name),
                });
            }
            Ok(reference(api_base, owner, repo, ref_name, sha))
        })
    }

    async fn delete_reference(
        &self,
        owner: &str,
        repo: &str,
        ref_path: &str,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::DeleteReference {
            repo: slug(owner, repo),
            ref_path: ref_path.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::DeleteReference(e) => Some(e.clone()),
            _ => None,
        })?;
        self.write_repo(owner, repo, |r, _| {
            let removed = if let Some(name) = ref_path.strip_prefix("heads/") {
                let before = r.branches.len();
                r.branches.retain(|b| b.name != name);
                before != r.branches.len()
            } else if let Some(name) = ref_path.strip_prefix("tags/") {
                let before = r.tags.len();
                r.tags.retain(|t| t.name != name);
                before != r.tags.len()
            } else {
                false
            };
            if removed {
                Ok(())
            } else {
                Err(ForgeError::ApiError {
                    status: 422,
                    message: "Reference does not exist".to_string(),
                })
            }
        })
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<ApiPullRequest>, ForgeError> {
        self.record(MockOperation::ListPullRequests {
            repo: slug(owner, repo),
            state: state.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::ListPullRequests(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| {
            Ok(r.pulls
                .iter()
                .filter(|p| state.matches(p.state.as_deref().unwrap_or("open")))
                .cloned()
                .collect())
        })
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: NewPullRequest,
    ) -> Result<ApiPullRequest, ForgeError> {
        self.record(MockOperation::CreatePullRequest {
            repo: slug(owner, repo),
            head: request.head.clone(),
            base: request.base.clone(),
        });
        self.check_fail(|f| match f {
            FailOn::CreatePullRequest(e) => Some(e.clone()),
            _ => None,
        })?;
        let id = self.next_id();
        self.write_repo(owner, repo, |r, _| {
            let tip = |name: &str| {
                r.branches
                    .iter()
                    .find(|b| b.name == name)
                    .and_then(|b| b.commit.sha.clone())
            };
            let head_sha = tip(&request.head).ok_or_else(|| ForgeError::ApiError {
                status: 422,
                message: format!("head branch {} does not exist", request.head),
            })?;
            let base_sha = tip(&request.base).ok_or_else(|| ForgeError::ApiError {
                status: 422,
                message: format!("base branch {} does not exist", request.base),
            })?;
            let number = r.pulls.iter().map(|p| p.number).max().unwrap_or(0) + 1;
            let pull = ApiPullRequest {
                id,
                number,
                title: Some(request.title.clone()),
                state: Some("open".to_string()),
                locked: Some(false),
                draft: Some(false),
                html_url: Some(format!("https://github.com/{}/{}/pull/{}", owner, repo, number)),
                head: ApiPullRef {
                    ref_name: request.head.clone(),
                    sha: Some(head_sha),
                },
                base: ApiPullRef {
                    ref_name: request.base.clone(),
                    sha: Some(base_sha),
                },
                merged_at: None,
                closed_at: None,
            };
            r.pulls.push(pull.clone());
            Ok(pull)
        })
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<ApiIssue>, ForgeError> {
        self.record(MockOperation::ListIssues {
            repo: slug(owner, repo),
            state: state.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::ListIssues(e) => Some(e.clone()),
            _ => None,
        })?;
        self.read_repo(owner, repo, |r, _| {
            Ok(r.issues
                .iter()
                .filter(|i| state.matches(i.state.as_deref().unwrap_or("open")))
                .cloned()
                .collect())
        })
    }

    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::AddCollaborator {
            repo: slug(owner, repo),
            user: user.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::AddCollaborator(e) => Some(e.clone()),
            _ => None,
        })?;
        let id = self.next_id();
        self.write_repo(owner, repo, |r, _| {
            if r.collaborators.insert(user.to_string()) {
                r.invitations.push(ApiInvitation {
                    id,
                    invitee: Some(ApiOwner {
                        login: user.to_string(),
                    }),
                    permissions: Some("write".to_string()),
                });
            }
            Ok(())
        })
    }

    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::RemoveCollaborator {
            repo: slug(owner, repo),
            user: user.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::RemoveCollaborator(e) => Some(e.clone()),
            _ => None,
        })?;
        self.write_repo(owner, repo, |r, _| {
            r.collaborators.remove(user);
            Ok(())
        })
    }

    async fn list_invitations(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ApiInvitation>, ForgeError> {
        self.record(MockOperation::ListInvitations {
            repo: slug(owner, repo),
        });
        self.read_repo(owner, repo, |r, _| Ok(r.invitations.clone()))
    }

    async fn delete_invitation(
        &self,
        owner: &str,
        repo: &str,
        id: u64,
    ) -> Result<(), ForgeError> {
        self.record(MockOperation::DeleteInvitation {
            repo: slug(owner, repo),
            id,
        });
        self.write_repo(owner, repo, |r, _| {
            let before = r.invitations.len();
            r.invitations.retain(|i| i.id != id);
            if before == r.invitations.len() {
                Err(not_found(format!("invitation {}", id)))
            } else {
                Ok(())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha(c: char) -> String {
        c.to_string().repeat(40)
    }

    fn forge() -> MockForge {
        MockForge::new()
            .with_commit("o", "r", &sha('a'), "root", "2024-01-01T00:00:00Z", &[])
            .with_commit("o", "r", &sha('b'), "child", "2024-01-02T00:00:00Z", &[&sha('a')])
            .with_branch("o", "r", "main", &sha('b'))
    }

    #[test]
    fn forge_name() {
        assert_eq!(MockForge::new().name(), "mock");
    }

    #[tokio::test]
    async fn seeded_repository_is_owned_by_its_key() {
        let forge = MockForge::new().with_repository(
            "octocat",
            ApiRepository {
                name: "demo".into(),
                description: Some("seeded".into()),
                ..Default::default()
            },
        );
        let repo = forge.get_repository("octocat", "demo").await.unwrap();
        assert_eq!(repo.owner.unwrap().login, "octocat");
        assert_eq!(repo.description.as_deref(), Some("seeded"));
    }

    #[tokio::test]
    async fn loose_urls_use_provider_shapes() {
        let forge = forge();

        let branch = forge.get_branch("o", "r", "main").await.unwrap();
        assert_eq!(
            branch.commit.url.unwrap(),
            format!("https://api.github.com/repos/o/r/commits/{}", sha('b'))
        );

        let commit = forge.get_commit("o", "r", &sha('b')).await.unwrap();
        assert_eq!(
            commit.parents[0].url.as_deref().unwrap(),
            format!("https://api.github.com/repos/o/r/git/commits/{}", sha('a'))
        );
    }

    #[tokio::test]
    async fn custom_api_base_applies_to_urls() {
        let forge = MockForge::new()
            .with_api_base("http://127.0.0.1:9/api/v3/")
            .with_branch("o", "r", "main", &sha('a'));
        assert_eq!(forge.api_base(), "http://127.0.0.1:9/api/v3");
        let branch = forge.get_branch("o", "r", "main").await.unwrap();
        assert!(branch
            .commit
            .url
            .unwrap()
            .starts_with("http://127.0.0.1:9/api/v3/repos/o/r/commits/"));
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let forge = forge();
        assert!(forge
            .get_commit("o", "r", &sha('f'))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(forge.get_branch("o", "r", "nope").await.unwrap_err().is_not_found());
        assert!(forge.list_branches("o", "missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn fail_on_single_commit() {
        let forge = forge().fail_on(FailOn::GetCommitSha {
            sha: sha('a'),
            error: ForgeError::RateLimited,
        });
        assert!(forge.get_commit("o", "r", &sha('b')).await.is_ok());
        assert_eq!(
            forge.get_commit("o", "r", &sha('a')).await.unwrap_err(),
            ForgeError::RateLimited
        );
    }

    #[tokio::test]
    async fn references_create_and_delete_branches_and_tags() {
        let forge = forge();

        forge
            .create_reference("o", "r", "refs/heads/feature", &sha('a'))
            .await
            .unwrap();
        forge
            .create_reference("o", "r", "refs/tags/v1", &sha('b'))
            .await
            .unwrap();
        assert_eq!(forge.branch_names("o", "r"), vec!["main", "feature"]);
        assert_eq!(forge.tag_names("o", "r"), vec!["v1"]);

        let again = forge
            .create_reference("o", "r", "refs/heads/feature", &sha('a'))
            .await;
        assert!(matches!(again, Err(ForgeError::ApiError { status: 422, .. })));

        let found = forge.get_reference("o", "r", "tags/v1").await.unwrap();
        assert_eq!(found.object.sha, sha('b'));

        forge.delete_reference("o", "r", "heads/feature").await.unwrap();
        assert_eq!(forge.branch_names("o", "r"), vec!["main"]);
        assert!(forge.delete_reference("o", "r", "heads/feature").await.is_err());
    }

    #[tokio::test]
    async fn collaborators_and_invitations() {
        let forge = forge();
        forge.add_collaborator("o", "r", "hubot").await.unwrap();
        assert_eq!(forge.collaborators("o", "r"), vec!["hubot"]);

        let invitations = forge.list_invitations("o", "r").await.unwrap();
        assert_eq!(invitations.len(), 1);

        forge.remove_collaborator("o", "r", "hubot").await.unwrap();
        forge
            .delete_invitation("o", "r", invitations[0].id)
            .await
            .unwrap();
        assert!(forge.collaborators("o", "r").is_empty());
        assert!(forge.list_invitations("o", "r").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pull_requests_filter_by_state() {
        let forge = forge().with_branch("o", "r", "feature", &sha('a'));
        let pr = forge
            .create_pull_request(
                "o",
                "r",
                NewPullRequest {
                    title: "Add feature".into(),
                    head: "feature".into(),
                    base: "main".into(),
                    body: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(pr.number, 1);
        assert_eq!(pr.head.sha, Some(sha('a')));

        assert_eq!(
            forge
                .list_pull_requests("o", "r", ListState::Open)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(forge
            .list_pull_requests("o", "r", ListState::Closed)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn operations_recorded() {
        let forge = forge();
        forge.get_commit("o", "r", &sha('a')).await.unwrap();
        forge.get_commit("o", "r", &sha('a')).await.unwrap();

        assert_eq!(forge.commit_fetches(&sha('a')), 2);
        assert!(matches!(
            forge.operations()[0],
            MockOperation::GetCommit { .. }
        ));

        forge.clear_operations();
        assert!(forge.operations().is_empty());
    }

    #[tokio::test]
    async fn create_repository_owned_by_authenticated_user() {
        let forge = MockForge::new().with_authenticated_user("hubot");
        let repo = forge
            .create_repository(NewRepository {
                name: "new".into(),
                description: Some("d".into()),
                private: true,
            })
            .await
            .unwrap();
        assert_eq!(repo.owner.unwrap().login, "hubot");
        assert_eq!(forge.list_repositories("hubot").await.unwrap().len(), 1);
        assert!(forge
            .create_repository(NewRepository {
                name: "new".into(),
                description: None,
                private: false,
            })
            .await
            .is_err());
    }
}
