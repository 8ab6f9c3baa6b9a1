//! service::domain
//!
//! Domain records returned by [`super::GitService`].
//!
//! Records are plain immutable values. Fields the provider left out carry
//! zero values (empty string, 0, the Unix epoch) rather than `Option`, so
//! consumers never branch on provider quirks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::Oid;

/// A GitHub account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub full_name: String,
    pub followers_count: u64,
    pub following_count: u64,
}

/// One language's fraction of a repository's bytes, in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageUsage {
    pub name: String,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub description: String,
    /// Browser URL
    pub link: String,
    pub is_private: bool,
    pub stars_count: u64,
    pub forks_count: u64,
    pub last_updated: DateTime<Utc>,
    /// Sorted by share, largest first
    pub languages: Vec<LanguageUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    /// Author date of the tip commit
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: Oid,
    /// First line of the message
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub is_closed: bool,
    pub is_locked: bool,
    /// Set when the issue is itself a pull request
    pub resolved_pull_request_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    /// Number shown in the URL (`/pull/{number}`)
    pub number: u64,
    pub title: String,
    pub source_branch: String,
    pub target_branch: String,
    pub is_closed: bool,
    pub is_merged: bool,
    pub is_locked: bool,
    pub link: String,
}

/// Review thread on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub is_resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub title: String,
    /// Commit the tag points at
    pub hash: Oid,
    /// Release notes, empty when the tag has no release
    pub description: String,
    pub zip_link: String,
    pub created_at: DateTime<Utc>,
}
