//! service
//!
//! Domain-typed operations over a [`Forge`].
//!
//! [`GitService`] composes the adapter, the reference resolver, the
//! ancestry walker and the mapper. Every failure is tagged with the
//! operation that produced it, and composite operations (repositories with
//! their languages, branches with their tip dates, tags with their
//! releases) stop at the first failing call.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hubkit::service::GitService;
//! use hubkit::history::WalkOptions;
//!
//! let service = GitService::new(Arc::new(forge), WalkOptions::default());
//! for commit in service.get_branch_commits("octocat", "Hello-World", "master").await? {
//!     println!("{} {}", commit.hash.short(7), commit.title);
//! }
//! ```

pub mod domain;
pub mod mapper;

pub use domain::{
    Branch, Commit, Issue, LanguageUsage, PullRequest, Repository, Tag, Thread, User,
};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::types::{BranchName, Oid, RefName, TagName, TypeError};
use crate::forge::schema::{ListState, NewPullRequest, NewRepository};
use crate::forge::{Forge, ForgeError};
use crate::history::{
    extract_hash, resolve, AncestryWalker, LooseReference, ResolveError, WalkError, WalkOptions,
};

/// Errors from service operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{operation}: {source}")]
    Forge {
        operation: &'static str,
        source: ForgeError,
    },

    #[error("{operation}: {source}")]
    Resolve {
        operation: &'static str,
        source: ResolveError,
    },

    #[error("{operation}: {source}")]
    Walk {
        operation: &'static str,
        source: WalkError,
    },

    #[error("{operation} is not supported: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Name of the operation that failed, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ServiceError::Forge { operation, .. }
            | ServiceError::Resolve { operation, .. }
            | ServiceError::Walk { operation, .. }
            | ServiceError::Unsupported { operation, .. } => Some(operation),
            ServiceError::InvalidInput(_) => None,
        }
    }

    /// Whether the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Forge { source, .. } => source.is_not_found(),
            ServiceError::Resolve {
                source: ResolveError::Fetch { source, .. },
                ..
            } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<TypeError> for ServiceError {
    fn from(err: TypeError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

fn forge_err(operation: &'static str) -> impl FnOnce(ForgeError) -> ServiceError {
    move |source| ServiceError::Forge { operation, source }
}

fn resolve_err(operation: &'static str) -> impl FnOnce(ResolveError) -> ServiceError {
    move |source| ServiceError::Resolve { operation, source }
}

fn require(value: &str, what: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(())
}

/// Domain-typed client over a forge.
#[derive(Clone)]
pub struct GitService {
    forge: Arc<dyn Forge>,
    walk: WalkOptions,
}

impl std::fmt::Debug for GitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitService")
            .field("forge", &self.forge.name())
            .field("walk", &self.walk)
            .finish()
    }
}

impl GitService {
    pub fn new(forge: Arc<dyn Forge>, walk: WalkOptions) -> Self {
        Self { forge, walk }
    }

    pub fn forge(&self) -> &dyn Forge {
        self.forge.as_ref()
    }

    pub fn walk_options(&self) -> &WalkOptions {
        &self.walk
    }

    // --- users -------------------------------------------------------------

    pub async fn get_user_info(&self, user: &str) -> Result<User, ServiceError> {
        const OP: &str = "get_user_info";
        require(user, "user name")?;
        let api = self.forge.get_user(user).await.map_err(forge_err(OP))?;
        Ok(mapper::user(api))
    }

    // --- repositories ------------------------------------------------------

    /// Every repository of `owner`, one languages request each.
    pub async fn get_user_repositories(
        &self,
        owner: &str,
    ) -> Result<Vec<Repository>, ServiceError> {
        const OP: &str = "get_user_repositories";
        require(owner, "owner")?;
        let repos = self
            .forge
            .list_repositories(owner)
            .await
            .map_err(forge_err(OP))?;

        let mut result = Vec::with_capacity(repos.len());
        for repo in repos {
            let repo_owner = repo
                .owner
                .as_ref()
                .map(|o| o.login.clone())
                .unwrap_or_else(|| owner.to_string());
            let languages = self
                .forge
                .list_languages(&repo_owner, &repo.name)
                .await
                .map_err(forge_err(OP))?;
            result.push(mapper::repository(repo, &languages));
        }
        Ok(result)
    }

    pub async fn get_repository_by_name(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Repository, ServiceError> {
        const OP: &str = "get_repository_by_name";
        require(owner, "owner")?;
        require(repo, "repository name")?;
        let api = self
            .forge
            .get_repository(owner, repo)
            .await
            .map_err(forge_err(OP))?;
        let languages = self
            .forge
            .list_languages(owner, repo)
            .await
            .map_err(forge_err(OP))?;
        Ok(mapper::repository(api, &languages))
    }

    /// Create a repository owned by the authenticated user.
    pub async fn create_repository(
        &self,
        name: &str,
        description: Option<&str>,
        private: bool,
    ) -> Result<Repository, ServiceError> {
        const OP: &str = "create_repository";
        require(name, "repository name")?;
        let api = self
            .forge
            .create_repository(NewRepository {
                name: name.to_string(),
                description: description.map(str::to_string),
                private,
            })
            .await
            .map_err(forge_err(OP))?;
        info!(name, private, "created repository");
        Ok(mapper::repository(api, &Default::default()))
    }

    pub async fn get_repository_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<User>, ServiceError> {
        const OP: &str = "get_repository_contributors";
        let contributors = self
            .forge
            .list_contributors(owner, repo)
            .await
            .map_err(forge_err(OP))?;

        let mut users = Vec::with_capacity(contributors.len());
        for contributor in contributors {
            let profile = self
                .forge
                .get_user_by_id(contributor.id)
                .await
                .map_err(forge_err(OP))?;
            users.push(mapper::user(crate::forge::schema::ApiUser {
                login: contributor.login,
                ..profile
            }));
        }
        Ok(users)
    }

    // --- branches and commits ----------------------------------------------

    /// Branches with the author date of their tip commit.
    pub async fn get_repository_branches(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Branch>, ServiceError> {
        const OP: &str = "get_repository_branches";
        let branches = self
            .forge
            .list_branches(owner, repo)
            .await
            .map_err(forge_err(OP))?;

        let mut result = Vec::with_capacity(branches.len());
        for branch in &branches {
            let tip = resolve(
                self.forge(),
                &LooseReference::branch_tip(&branch.commit),
                owner,
                repo,
            )
            .await
            .map_err(resolve_err(OP))?;
            result.push(mapper::branch(branch, &tip));
        }
        Ok(result)
    }

    /// Create `branch` at the current tip of `from`.
    pub async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from: &str,
    ) -> Result<(), ServiceError> {
        const OP: &str = "create_branch";
        let branch = BranchName::new(branch)?;
        let from = BranchName::new(from)?;

        let tip = self.branch_tip(OP, owner, repo, &from).await?;
        let ref_name = RefName::for_branch(&branch);
        self.forge
            .create_reference(owner, repo, ref_name.as_str(), tip.as_str())
            .await
            .map_err(forge_err(OP))?;
        info!(%branch, %from, tip = tip.short(7), "created branch");
        Ok(())
    }

    pub async fn delete_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), ServiceError> {
        const OP: &str = "delete_branch";
        let branch = BranchName::new(branch)?;
        self.forge
            .delete_reference(owner, repo, RefName::for_branch(&branch).api_path())
            .await
            .map_err(forge_err(OP))?;
        info!(%branch, "deleted branch");
        Ok(())
    }

    /// Full ancestry of the branch tip, tip first.
    pub async fn get_branch_commits(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<Commit>, ServiceError> {
        const OP: &str = "get_branch_commits";
        let branch = BranchName::new(branch)?;
        let api = self
            .forge
            .get_branch(owner, repo, branch.as_str())
            .await
            .map_err(forge_err(OP))?;

        let walker = AncestryWalker::new(self.forge(), self.walk.clone());
        let set = walker
            .walk(&LooseReference::branch_tip(&api.commit), owner, repo)
            .await
            .map_err(|source| ServiceError::Walk {
                operation: OP,
                source,
            })?;
        Ok(set.iter().map(mapper::commit).collect())
    }

    // --- pull requests, threads, issues ------------------------------------

    pub async fn get_repository_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        const OP: &str = "get_repository_pull_requests";
        let pulls = self
            .forge
            .list_pull_requests(owner, repo, state)
            .await
            .map_err(forge_err(OP))?;
        Ok(pulls.into_iter().map(mapper::pull_request).collect())
    }

    /// Open a pull request merging `source` into `target`.
    pub async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        source: &str,
        target: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<PullRequest, ServiceError> {
        const OP: &str = "create_pull_request";
        let source = BranchName::new(source)?;
        let target = BranchName::new(target)?;
        require(title, "pull request title")?;
        if source == target {
            return Err(ServiceError::InvalidInput(format!(
                "source and target are both '{}'",
                source
            )));
        }

        let api = self
            .forge
            .create_pull_request(
                owner,
                repo,
                NewPullRequest {
                    title: title.to_string(),
                    head: source.to_string(),
                    base: target.to_string(),
                    body: body.map(str::to_string),
                },
            )
            .await
            .map_err(forge_err(OP))?;
        info!(number = api.number, %source, %target, "opened pull request");
        Ok(mapper::pull_request(api))
    }

    /// Review thread resolution is only exposed through GraphQL.
    pub async fn get_threads_info(
        &self,
        _owner: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<Vec<Thread>, ServiceError> {
        Err(ServiceError::Unsupported {
            operation: "get_threads_info",
            reason: "review thread resolution is not available from the REST API".to_string(),
        })
    }

    pub async fn get_issues(
        &self,
        owner: &str,
        repo: &str,
        state: ListState,
    ) -> Result<Vec<Issue>, ServiceError> {
        const OP: &str = "get_issues";
        let issues = self
            .forge
            .list_issues(owner, repo, state)
            .await
            .map_err(forge_err(OP))?;
        Ok(issues.into_iter().map(mapper::issue).collect())
    }

    // --- tags --------------------------------------------------------------

    /// Tags with their release notes and target commit.
    pub async fn get_repository_tags(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Tag>, ServiceError> {
        const OP: &str = "get_repository_tags";
        let tags = self
            .forge
            .list_tags(owner, repo)
            .await
            .map_err(forge_err(OP))?;

        let mut result = Vec::with_capacity(tags.len());
        for tag in &tags {
            let target = resolve(
                self.forge(),
                &LooseReference::branch_tip(&tag.commit),
                owner,
                repo,
            )
            .await
            .map_err(resolve_err(OP))?;
            let release = self
                .forge
                .get_release_by_tag(owner, repo, &tag.name)
                .await
                .map_err(forge_err(OP))?;
            result.push(mapper::tag(tag, release.as_ref(), &target));
        }
        Ok(result)
    }

    /// Create a lightweight tag at the current tip of branch `target`.
    pub async fn create_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
        target: &str,
    ) -> Result<(), ServiceError> {
        const OP: &str = "create_tag";
        let tag = TagName::new(tag)?;
        let target = BranchName::new(target)?;

        let tip = self.branch_tip(OP, owner, repo, &target).await?;
        self.forge
            .create_reference(owner, repo, RefName::for_tag(&tag).as_str(), tip.as_str())
            .await
            .map_err(forge_err(OP))?;
        info!(%tag, %target, tip = tip.short(7), "created tag");
        Ok(())
    }

    pub async fn delete_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<(), ServiceError> {
        const OP: &str = "delete_tag";
        let tag = TagName::new(tag)?;
        self.forge
            .delete_reference(owner, repo, RefName::for_tag(&tag).api_path())
            .await
            .map_err(forge_err(OP))?;
        info!(%tag, "deleted tag");
        Ok(())
    }

    // --- access ------------------------------------------------------------

    pub async fn set_access_to_repository(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ServiceError> {
        const OP: &str = "set_access_to_repository";
        require(user, "user name")?;
        self.forge
            .add_collaborator(owner, repo, user)
            .await
            .map_err(forge_err(OP))?;
        info!(user, "granted repository access");
        Ok(())
    }

    /// Remove `user` as a collaborator and withdraw their pending invitations.
    pub async fn deny_access_to_repository(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), ServiceError> {
        const OP: &str = "deny_access_to_repository";
        require(user, "user name")?;
        self.forge
            .remove_collaborator(owner, repo, user)
            .await
            .map_err(forge_err(OP))?;

        let invitations = self
            .forge
            .list_invitations(owner, repo)
            .await
            .map_err(forge_err(OP))?;
        for invitation in invitations {
            let invited = invitation
                .invitee
                .as_ref()
                .map(|i| i.login.eq_ignore_ascii_case(user))
                .unwrap_or(false);
            if invited {
                debug!(id = invitation.id, user, "withdrawing invitation");
                self.forge
                    .delete_invitation(owner, repo, invitation.id)
                    .await
                    .map_err(forge_err(OP))?;
            }
        }
        info!(user, "revoked repository access");
        Ok(())
    }

    /// Current tip hash of a branch, without fetching the commit.
    async fn branch_tip(
        &self,
        operation: &'static str,
        owner: &str,
        repo: &str,
        branch: &BranchName,
    ) -> Result<Oid, ServiceError> {
        let api = self
            .forge
            .get_branch(owner, repo, branch.as_str())
            .await
            .map_err(forge_err(operation))?;
        extract_hash(
            &LooseReference::branch_tip(&api.commit),
            self.forge.api_base(),
            owner,
            repo,
        )
        .map_err(resolve_err(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use crate::forge::schema::{ApiContributor, ApiInvitation, ApiOwner, ApiUser};

    fn sha(c: char) -> String {
        c.to_string().repeat(40)
    }

    fn service(forge: &MockForge) -> GitService {
        GitService::new(Arc::new(forge.clone()), WalkOptions::default())
    }

    fn linear() -> MockForge {
        MockForge::new()
            .with_commit("o", "r", &sha('c'), "first", "2024-01-01T00:00:00Z", &[])
            .with_commit("o", "r", &sha('b'), "second", "2024-01-02T00:00:00Z", &[&sha('c')])
            .with_commit("o", "r", &sha('a'), "third\n\nbody", "2024-01-03T00:00:00Z", &[&sha('b')])
            .with_branch("o", "r", "main", &sha('a'))
            .with_branch("o", "r", "old", &sha('c'))
    }

    #[tokio::test]
    async fn branch_commits_tip_first() {
        let forge = linear();
        let commits = service(&forge)
            .get_branch_commits("o", "r", "main")
            .await
            .unwrap();

        let titles: Vec<_> = commits.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert_eq!(commits[0].hash.as_str(), sha('a'));
    }

    #[tokio::test]
    async fn branches_carry_tip_dates() {
        let forge = linear();
        let branches = service(&forge)
            .get_repository_branches("o", "r")
            .await
            .unwrap();

        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].name, "main");
        assert_eq!(branches[0].updated_at.to_rfc3339(), "2024-01-03T00:00:00+00:00");
        assert_eq!(branches[1].updated_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn invalid_branch_name_rejected_before_any_call() {
        let forge = linear();
        let err = service(&forge)
            .get_branch_commits("o", "r", "bad..name")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(forge.operations().is_empty());
    }

    #[tokio::test]
    async fn walk_failure_tagged_with_operation() {
        let forge = linear().fail_on(FailOn::GetCommitSha {
            sha: sha('b'),
            error: ForgeError::RateLimited,
        });
        let err = service(&forge)
            .get_branch_commits("o", "r", "main")
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("get_branch_commits"));
        match err {
            ServiceError::Walk { source, .. } => {
                assert_eq!(source.failed_hash().unwrap().as_str(), sha('b'))
            }
            other => panic!("expected walk error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_and_delete_branch() {
        let forge = linear();
        let svc = service(&forge);

        svc.create_branch("o", "r", "feature/x", "old").await.unwrap();
        assert!(forge.operations().contains(&MockOperation::CreateReference {
            repo: "o/r".into(),
            ref_name: "refs/heads/feature/x".into(),
            sha: sha('c'),
        }));

        svc.delete_branch("o", "r", "feature/x").await.unwrap();
        assert_eq!(forge.branch_names("o", "r"), vec!["main", "old"]);
    }

    #[tokio::test]
    async fn create_and_delete_tag() {
        let forge = linear();
        let svc = service(&forge);

        svc.create_tag("o", "r", "v1.0", "main").await.unwrap();
        let tags = svc.get_repository_tags("o", "r").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].hash.as_str(), sha('a'));
        assert_eq!(tags[0].description, "");

        svc.delete_tag("o", "r", "v1.0").await.unwrap();
        assert!(forge.tag_names("o", "r").is_empty());
    }

    #[tokio::test]
    async fn threads_are_unsupported() {
        let forge = MockForge::new();
        let err = service(&forge)
            .get_threads_info("o", "r", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unsupported { .. }));
        assert!(forge.operations().is_empty());
    }

    #[tokio::test]
    async fn contributors_enriched_by_id() {
        let forge = linear()
            .with_contributor(
                "o",
                "r",
                ApiContributor {
                    login: "mona".into(),
                    id: 42,
                    contributions: Some(10),
                },
            )
            .with_user(ApiUser {
                login: "mona".into(),
                id: 42,
                name: Some("Mona Lisa".into()),
                followers: Some(5),
                following: Some(2),
            });

        let users = service(&forge)
            .get_repository_contributors("o", "r")
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_name, "mona");
        assert_eq!(users[0].full_name, "Mona Lisa");
        assert_eq!(users[0].followers_count, 5);
    }

    #[tokio::test]
    async fn deny_access_withdraws_invitations() {
        let forge = linear().with_invitation(
            "o",
            "r",
            ApiInvitation {
                id: 99,
                invitee: Some(ApiOwner {
                    login: "someone-else".into(),
                }),
                permissions: None,
            },
        );
        let svc = service(&forge);

        svc.set_access_to_repository("o", "r", "Hubot").await.unwrap();
        svc.deny_access_to_repository("o", "r", "hubot").await.unwrap();

        let remaining = forge.list_invitations("o", "r").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 99);
    }

    #[tokio::test]
    async fn composite_failure_stops_early() {
        let forge = linear()
            .with_repository(
                "o",
                crate::forge::schema::ApiRepository {
                    name: "other".into(),
                    ..Default::default()
                },
            )
            .fail_on(FailOn::ListLanguages(ForgeError::RateLimited));

        let err = service(&forge)
            .get_user_repositories("o")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Forge {
                operation: "get_user_repositories",
                source: ForgeError::RateLimited
            }
        );
        let language_calls = forge
            .operations()
            .iter()
            .filter(|op| matches!(op, MockOperation::ListLanguages { .. }))
            .count();
        assert_eq!(language_calls, 1);
    }

    #[tokio::test]
    async fn pull_request_same_branch_rejected() {
        let forge = linear();
        let err = service(&forge)
            .create_pull_request("o", "r", "main", "main", "t", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
