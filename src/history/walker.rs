//! history::walker
//!
//! Ancestry walk from a commit to everything reachable through its parents.
//!
//! # Order
//!
//! Pre-order: the start commit, then for each parent in declared order the
//! full walk of that parent. Under [`DuplicatePolicy::PreserveMultiplicity`]
//! a commit reachable along several paths appears once per path, so
//! `walk(C) == [C] ++ walk(P1) ++ ... ++ walk(Pn)` holds exactly. Under
//! [`DuplicatePolicy::DedupeByHash`] each commit appears once, at its first
//! pre-order position, and its ancestors are not revisited.
//!
//! # Resources
//!
//! The walk keeps an explicit stack of `(hash, next parent)` frames, so
//! history depth never grows the call stack. Resolved commits are memoized
//! by hash for the duration of one walk; each distinct hash costs one
//! request whatever the policy. Depth, output length and wall-clock time
//! are all bounded by [`WalkOptions`], and exceeding any bound fails the
//! walk. There is no partial result.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::reference::{
    extract_hash, fetch_commit, resolve, CommitRef, LooseReference, ResolveError,
};
use crate::core::types::Oid;
use crate::forge::Forge;

/// What to do with a commit reachable along more than one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Emit it once per path.
    #[default]
    PreserveMultiplicity,
    /// Emit it once, at its first position.
    DedupeByHash,
}

/// Bounds and policy for one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Longest parent chain followed, start commit included
    pub max_depth: usize,
    /// Longest result produced
    pub max_commits: usize,
    /// Wall-clock budget for the whole walk
    pub deadline: Duration,
    pub duplicates: DuplicatePolicy,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: 10_000,
            max_commits: 50_000,
            deadline: Duration::from_secs(300),
            duplicates: DuplicatePolicy::PreserveMultiplicity,
        }
    }
}

/// Errors from an ancestry walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("ancestry deeper than {limit} commits at {hash}")]
    DepthExceeded { limit: usize, hash: Oid },

    #[error("ancestry has more than {limit} entries")]
    TooManyCommits { limit: usize },

    #[error("commit {hash} is its own ancestor")]
    Cycle { hash: Oid },

    #[error("ancestry walk did not finish within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },
}

impl WalkError {
    /// Hash the walk stopped at, when there is one.
    pub fn failed_hash(&self) -> Option<&Oid> {
        match self {
            WalkError::Resolve(e) => e.hash(),
            WalkError::DepthExceeded { hash, .. } | WalkError::Cycle { hash } => Some(hash),
            WalkError::TooManyCommits { .. } | WalkError::DeadlineExceeded { .. } => None,
        }
    }
}

/// Result of a walk: hashes in walk order over an owned commit map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestrySet {
    order: Vec<Oid>,
    commits: HashMap<Oid, CommitRef>,
}

impl AncestrySet {
    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct commits.
    pub fn distinct(&self) -> usize {
        self.commits.len()
    }

    /// The start commit.
    pub fn tip(&self) -> Option<&CommitRef> {
        self.order.first().and_then(|hash| self.commits.get(hash))
    }

    pub fn hashes(&self) -> &[Oid] {
        &self.order
    }

    pub fn get(&self, hash: &Oid) -> Option<&CommitRef> {
        self.commits.get(hash)
    }

    /// Commits in walk order.
    pub fn iter(&self) -> impl Iterator<Item = &CommitRef> + '_ {
        self.order.iter().filter_map(|hash| self.commits.get(hash))
    }

    /// Commits in walk order, cloned out of the map.
    pub fn into_commits(self) -> Vec<CommitRef> {
        let AncestrySet { order, commits } = self;
        order
            .into_iter()
            .filter_map(|hash| commits.get(&hash).cloned())
            .collect()
    }
}

struct Frame {
    hash: Oid,
    next_parent: usize,
}

/// Walks commit ancestry through a [`Forge`].
pub struct AncestryWalker<'a> {
    forge: &'a dyn Forge,
    options: WalkOptions,
}

impl<'a> AncestryWalker<'a> {
    pub fn new(forge: &'a dyn Forge, options: WalkOptions) -> Self {
        Self { forge, options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Walk everything reachable from `start`.
    ///
    /// # Errors
    ///
    /// Any resolution failure, a bound from [`WalkOptions`] being hit, or a
    /// cycle in the parent graph.
    pub async fn walk(
        &self,
        start: &LooseReference,
        owner: &str,
        repo: &str,
    ) -> Result<AncestrySet, WalkError> {
        let deadline = self.options.deadline;
        tokio::time::timeout(deadline, self.walk_unbounded(start, owner, repo))
            .await
            .map_err(|_| WalkError::DeadlineExceeded { deadline })?
    }

    async fn walk_unbounded(
        &self,
        start: &LooseReference,
        owner: &str,
        repo: &str,
    ) -> Result<AncestrySet, WalkError> {
        let api_base = self.forge.api_base();
        let dedupe = self.options.duplicates == DuplicatePolicy::DedupeByHash;

        let root = resolve(self.forge, start, owner, repo).await?;
        let root_hash = root.hash.clone();

        let mut commits: HashMap<Oid, CommitRef> = HashMap::new();
        let mut order: Vec<Oid> = Vec::new();
        let mut emitted: HashSet<Oid> = HashSet::new();
        let mut on_path: HashSet<Oid> = HashSet::new();

        self.push_entry(&mut order, &root_hash)?;
        if self.options.max_depth == 0 {
            return Err(WalkError::DepthExceeded {
                limit: 0,
                hash: root_hash,
            });
        }
        commits.insert(root_hash.clone(), root);
        emitted.insert(root_hash.clone());
        on_path.insert(root_hash.clone());
        let mut stack = vec![Frame {
            hash: root_hash.clone(),
            next_parent: 0,
        }];

        while let Some(top) = stack.last_mut() {
            let next = commits
                .get(&top.hash)
                .and_then(|commit| commit.parents.get(top.next_parent))
                .cloned();
            let Some(parent) = next else {
                on_path.remove(&top.hash);
                stack.pop();
                continue;
            };
            top.next_parent += 1;

            let hash = extract_hash(&parent, api_base, owner, repo)?;
            if on_path.contains(&hash) {
                return Err(WalkError::Cycle { hash });
            }
            if dedupe && emitted.contains(&hash) {
                continue;
            }
            if stack.len() >= self.options.max_depth {
                return Err(WalkError::DepthExceeded {
                    limit: self.options.max_depth,
                    hash,
                });
            }

            if !commits.contains_key(&hash) {
                let commit = fetch_commit(self.forge, &hash, owner, repo).await?;
                commits.insert(hash.clone(), commit);
            } else {
                debug!(%hash, "commit already resolved in this walk");
            }

            self.push_entry(&mut order, &hash)?;
            emitted.insert(hash.clone());
            on_path.insert(hash.clone());
            stack.push(Frame {
                hash,
                next_parent: 0,
            });
        }

        info!(
            tip = %root_hash,
            entries = order.len(),
            distinct = commits.len(),
            "ancestry walk complete"
        );
        Ok(AncestrySet { order, commits })
    }

    fn push_entry(&self, order: &mut Vec<Oid>, hash: &Oid) -> Result<(), WalkError> {
        if order.len() >= self.options.max_commits {
            return Err(WalkError::TooManyCommits {
                limit: self.options.max_commits,
            });
        }
        order.push(hash.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge};
    use crate::forge::schema::{ApiCommitPointer, ApiGitCommit};
    use crate::forge::ForgeError;

    fn sha(c: char) -> String {
        c.to_string().repeat(40)
    }

    fn tip_of(c: char) -> LooseReference {
        LooseReference::BranchTip {
            url: format!("https://api.github.com/repos/o/r/commits/{}", sha(c)),
            sha: Some(sha(c)),
        }
    }

    fn order(set: &AncestrySet) -> Vec<char> {
        set.iter()
            .map(|c| c.hash.as_str().chars().next().unwrap())
            .collect()
    }

    /// d <- b, d <- c, b <- a, c <- a (a has parents b then c)
    fn diamond() -> MockForge {
        MockForge::new()
            .with_commit("o", "r", &sha('d'), "root", "2024-01-01T00:00:00Z", &[])
            .with_commit("o", "r", &sha('b'), "left", "2024-01-02T00:00:00Z", &[&sha('d')])
            .with_commit("o", "r", &sha('c'), "right", "2024-01-03T00:00:00Z", &[&sha('d')])
            .with_commit(
                "o",
                "r",
                &sha('a'),
                "merge",
                "2024-01-04T00:00:00Z",
                &[&sha('b'), &sha('c')],
            )
    }

    #[tokio::test]
    async fn root_commit_walks_to_itself() {
        let forge = diamond();
        let walker = AncestryWalker::new(&forge, WalkOptions::default());

        let set = walker.walk(&tip_of('d'), "o", "r").await.unwrap();
        assert_eq!(order(&set), vec!['d']);
        assert_eq!(set.tip().unwrap().message, "root");
    }

    #[tokio::test]
    async fn diamond_preserves_multiplicity() {
        let forge = diamond();
        let walker = AncestryWalker::new(&forge, WalkOptions::default());

        let set = walker.walk(&tip_of('a'), "o", "r").await.unwrap();
        assert_eq!(order(&set), vec!['a', 'b', 'd', 'c', 'd']);
        assert_eq!(set.len(), 5);
        assert_eq!(set.distinct(), 4);
        assert_eq!(forge.commit_fetches(&sha('d')), 1);
    }

    #[tokio::test]
    async fn diamond_dedupes_by_hash() {
        let forge = diamond();
        let options = WalkOptions {
            duplicates: DuplicatePolicy::DedupeByHash,
            ..WalkOptions::default()
        };
        let walker = AncestryWalker::new(&forge, options);

        let set = walker.walk(&tip_of('a'), "o", "r").await.unwrap();
        assert_eq!(order(&set), vec!['a', 'b', 'd', 'c']);
    }

    #[tokio::test]
    async fn failure_mid_walk_names_hash() {
        let forge = diamond().fail_on(FailOn::GetCommitSha {
            sha: sha('c'),
            error: ForgeError::NetworkError("connection reset".into()),
        });
        let walker = AncestryWalker::new(&forge, WalkOptions::default());

        let err = walker.walk(&tip_of('a'), "o", "r").await.unwrap_err();
        assert_eq!(err.failed_hash().unwrap().as_str(), sha('c'));
        assert!(err.to_string().contains(&sha('c')));
    }

    #[tokio::test]
    async fn cycle_detected() {
        let parent_of = |c: char| ApiCommitPointer {
            sha: Some(sha(c)),
            url: Some(format!(
                "https://api.github.com/repos/o/r/git/commits/{}",
                sha(c)
            )),
        };
        let forge = MockForge::new()
            .with_raw_commit(
                "o",
                "r",
                ApiGitCommit {
                    sha: sha('a'),
                    parents: vec![parent_of('b')],
                    ..Default::default()
                },
            )
            .with_raw_commit(
                "o",
                "r",
                ApiGitCommit {
                    sha: sha('b'),
                    parents: vec![parent_of('a')],
                    ..Default::default()
                },
            );
        let walker = AncestryWalker::new(&forge, WalkOptions::default());

        let err = walker.walk(&tip_of('a'), "o", "r").await.unwrap_err();
        assert_eq!(err, WalkError::Cycle {
            hash: Oid::new(sha('a')).unwrap()
        });
    }

    #[tokio::test]
    async fn malformed_parent_url_aborts() {
        let forge = MockForge::new().with_raw_commit(
            "o",
            "r",
            ApiGitCommit {
                sha: sha('a'),
                parents: vec![ApiCommitPointer {
                    sha: None,
                    url: Some(format!("https://api.github.com/repos/o/r/commits/{}", sha('b'))),
                }],
                ..Default::default()
            },
        );
        let walker = AncestryWalker::new(&forge, WalkOptions::default());

        let err = walker.walk(&tip_of('a'), "o", "r").await.unwrap_err();
        assert!(matches!(
            err,
            WalkError::Resolve(ResolveError::UnexpectedReferenceShape { .. })
        ));
    }

    #[tokio::test]
    async fn depth_bound() {
        let forge = diamond();
        let options = WalkOptions {
            max_depth: 2,
            ..WalkOptions::default()
        };
        let walker = AncestryWalker::new(&forge, options);

        let err = walker.walk(&tip_of('a'), "o", "r").await.unwrap_err();
        assert_eq!(
            err,
            WalkError::DepthExceeded {
                limit: 2,
                hash: Oid::new(sha('d')).unwrap()
            }
        );
    }

    #[tokio::test]
    async fn commit_count_bound() {
        let forge = diamond();
        let options = WalkOptions {
            max_commits: 4,
            ..WalkOptions::default()
        };
        let walker = AncestryWalker::new(&forge, options);

        assert_eq!(
            walker.walk(&tip_of('a'), "o", "r").await.unwrap_err(),
            WalkError::TooManyCommits { limit: 4 }
        );
    }

    #[tokio::test]
    async fn deadline_bound() {
        let forge = diamond().with_commit_delay(Duration::from_millis(200));
        let options = WalkOptions {
            deadline: Duration::from_millis(20),
            ..WalkOptions::default()
        };
        let walker = AncestryWalker::new(&forge, options);

        assert!(matches!(
            walker.walk(&tip_of('a'), "o", "r").await,
            Err(WalkError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn default_options() {
        let options = WalkOptions::default();
        assert_eq!(options.duplicates, DuplicatePolicy::PreserveMultiplicity);
        assert!(options.max_depth > 0 && options.max_commits > 0);
    }
}
