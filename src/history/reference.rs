//! history::reference
//!
//! Loose references and their resolution into canonical commits.
//!
//! # Shapes
//!
//! GitHub hands out commit pointers as URLs, and not always the same kind:
//!
//! | variant     | where it appears          | prefix                                  |
//! |-------------|---------------------------|-----------------------------------------|
//! | `BranchTip` | branch and tag listings   | `{api}/repos/{owner}/{repo}/commits/`     |
//! | `Parent`    | parent list of a commit   | `{api}/repos/{owner}/{repo}/git/commits/` |
//!
//! [`extract_hash`] strips the variant's own prefix and validates what is
//! left. Anything else is rejected up front with
//! [`ResolveError::UnexpectedReferenceShape`] rather than sent to the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::types::Oid;
use crate::forge::schema::{ApiCommitPointer, ApiGitCommit};
use crate::forge::{Forge, ForgeError};

/// Commit pointer as returned by the provider, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LooseReference {
    /// Tip pointer from a branch or tag listing.
    BranchTip { url: String, sha: Option<String> },
    /// Entry in a commit's parent list.
    Parent { url: String, sha: Option<String> },
}

impl LooseReference {
    /// Branch or tag tip pointer.
    pub fn branch_tip(pointer: &ApiCommitPointer) -> Self {
        LooseReference::BranchTip {
            url: pointer.url.clone().unwrap_or_default(),
            sha: pointer.sha.clone(),
        }
    }

    /// Parent pointer.
    pub fn parent(pointer: &ApiCommitPointer) -> Self {
        LooseReference::Parent {
            url: pointer.url.clone().unwrap_or_default(),
            sha: pointer.sha.clone(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            LooseReference::BranchTip { url, .. } | LooseReference::Parent { url, .. } => url,
        }
    }

    /// The provider's own `sha` field, when it sent one.
    pub fn provider_sha(&self) -> Option<&str> {
        match self {
            LooseReference::BranchTip { sha, .. } | LooseReference::Parent { sha, .. } => {
                sha.as_deref()
            }
        }
    }

    /// Prefix this variant's URL must start with.
    pub fn expected_prefix(&self, api_base: &str, owner: &str, repo: &str) -> String {
        let api_base = api_base.trim_end_matches('/');
        match self {
            LooseReference::BranchTip { .. } => {
                format!("{}/repos/{}/{}/commits/", api_base, owner, repo)
            }
            LooseReference::Parent { .. } => {
                format!("{}/repos/{}/{}/git/commits/", api_base, owner, repo)
            }
        }
    }
}

/// A fully resolved commit: canonical hash plus the data the domain needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub hash: Oid,
    pub message: String,
    /// Author timestamp, falling back to the committer's, then the epoch.
    pub authored_at: DateTime<Utc>,
    /// Parents in declared order, still unresolved.
    pub parents: Vec<LooseReference>,
}

impl CommitRef {
    /// Build from a provider commit fetched for `requested`.
    ///
    /// # Errors
    ///
    /// `ResolveError::MalformedCommit` if the payload's hash is invalid or
    /// names a different commit.
    pub fn from_api(requested: &Oid, commit: ApiGitCommit) -> Result<Self, ResolveError> {
        let hash = Oid::new(&commit.sha).map_err(|e| ResolveError::MalformedCommit {
            hash: requested.clone(),
            reason: e.to_string(),
        })?;
        if &hash != requested {
            return Err(ResolveError::MalformedCommit {
                hash: requested.clone(),
                reason: format!("provider returned commit {}", hash),
            });
        }

        let authored_at = commit
            .author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| commit.committer.as_ref().and_then(|c| c.date))
            .unwrap_or_default();

        Ok(CommitRef {
            hash,
            message: commit.message.unwrap_or_default(),
            authored_at,
            parents: commit.parents.iter().map(LooseReference::parent).collect(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Errors from resolving a loose reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The URL is not `<expected_prefix><hash>`, or disagrees with the
    /// provider's `sha` field.
    #[error("unexpected reference shape '{url}' (expected '{expected_prefix}<hash>')")]
    UnexpectedReferenceShape { url: String, expected_prefix: String },

    /// Fetching the commit failed.
    #[error("failed to fetch commit {hash}: {source}")]
    Fetch { hash: Oid, source: ForgeError },

    /// The fetched payload does not describe the requested commit.
    #[error("malformed commit {hash}: {reason}")]
    MalformedCommit { hash: Oid, reason: String },
}

impl ResolveError {
    /// Hash that failed, when one had been extracted.
    pub fn hash(&self) -> Option<&Oid> {
        match self {
            ResolveError::UnexpectedReferenceShape { .. } => None,
            ResolveError::Fetch { hash, .. } | ResolveError::MalformedCommit { hash, .. } => {
                Some(hash)
            }
        }
    }
}

/// Extract the canonical hash from a loose reference without any I/O.
///
/// The owner and repository part of the prefix is compared without regard
/// to ASCII case, since GitHub echoes the canonical spelling of names that
/// were requested in a different case.
///
/// ```
/// use hubkit::history::{extract_hash, LooseReference};
///
/// let sha = "7638417db6d59f3c431d3e1f261cc637155684cd";
/// let reference = LooseReference::Parent {
///     url: format!("https://api.github.com/repos/octocat/Hello-World/git/commits/{}", sha),
///     sha: Some(sha.to_string()),
/// };
/// let hash = extract_hash(&reference, "https://api.github.com", "octocat", "Hello-World").unwrap();
/// assert_eq!(hash.as_str(), sha);
/// ```
pub fn extract_hash(
    reference: &LooseReference,
    api_base: &str,
    owner: &str,
    repo: &str,
) -> Result<Oid, ResolveError> {
    let url = reference.url();
    let expected_prefix = reference.expected_prefix(api_base, owner, repo);
    let shape_error = || ResolveError::UnexpectedReferenceShape {
        url: url.to_string(),
        expected_prefix: expected_prefix.clone(),
    };

    let head = url.get(..expected_prefix.len()).ok_or_else(shape_error)?;
    if !head.eq_ignore_ascii_case(&expected_prefix) {
        return Err(shape_error());
    }
    let remainder = &url[expected_prefix.len()..];
    if remainder.contains(['/', '?', '#']) {
        return Err(shape_error());
    }
    let hash = Oid::new(remainder).map_err(|_| shape_error())?;

    if let Some(sha) = reference.provider_sha() {
        match Oid::new(sha) {
            Ok(provider_hash) if provider_hash == hash => {}
            _ => return Err(shape_error()),
        }
    }

    Ok(hash)
}

/// Fetch one commit by hash.
pub async fn fetch_commit(
    forge: &dyn Forge,
    hash: &Oid,
    owner: &str,
    repo: &str,
) -> Result<CommitRef, ResolveError> {
    debug!(%hash, owner, repo, "fetching commit");
    let commit = forge
        .get_commit(owner, repo, hash.as_str())
        .await
        .map_err(|source| ResolveError::Fetch {
            hash: hash.clone(),
            source,
        })?;
    CommitRef::from_api(hash, commit)
}

/// Resolve a loose reference into its commit: one round trip.
pub async fn resolve(
    forge: &dyn Forge,
    reference: &LooseReference,
    owner: &str,
    repo: &str,
) -> Result<CommitRef, ResolveError> {
    let hash = extract_hash(reference, forge.api_base(), owner, repo)?;
    fetch_commit(forge, &hash, owner, repo).await
}
