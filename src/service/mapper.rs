//! service::mapper
//!
//! Pure conversions from provider payloads to domain records.

use crate::forge::schema::{
    ApiBranch, ApiLanguages, ApiPullRequest, ApiIssue, ApiRelease, ApiRepository, ApiTag, ApiUser,
};
use crate::history::CommitRef;

use super::domain::{Branch, Commit, Issue, LanguageUsage, PullRequest, Repository, Tag, User};

pub fn user(api: ApiUser) -> User {
    User {
        user_name: api.login,
        full_name: api.name.unwrap_or_default(),
        followers_count: api.followers.unwrap_or_default(),
        following_count: api.following.unwrap_or_default(),
    }
}

/// Each language's share of the total byte count.
///
/// Empty when there are no languages or every count is zero. Sorted by
/// share descending, ties by name.
pub fn language_shares(languages: &ApiLanguages) -> Vec<LanguageUsage> {
    let total: u64 = languages.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<LanguageUsage> = languages
        .iter()
        .map(|(name, bytes)| LanguageUsage {
            name: name.clone(),
            share: *bytes as f64 / total as f64,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.share
            .total_cmp(&a.share)
            .then_with(|| a.name.cmp(&b.name))
    });
    shares
}

pub fn repository(api: ApiRepository, languages: &ApiLanguages) -> Repository {
    Repository {
        name: api.name,
        description: api.description.unwrap_or_default(),
        link: api.html_url.unwrap_or_default(),
        is_private: api.private.unwrap_or_default(),
        stars_count: api.stargazers_count.unwrap_or_default(),
        forks_count: api.forks_count.unwrap_or_default(),
        last_updated: api.updated_at.unwrap_or_default(),
        languages: language_shares(languages),
    }
}

pub fn branch(api: &ApiBranch, tip: &CommitRef) -> Branch {
    Branch {
        name: api.name.clone(),
        updated_at: tip.authored_at,
    }
}

pub fn commit(resolved: &CommitRef) -> Commit {
    Commit {
        hash: resolved.hash.clone(),
        title: resolved.message.lines().next().unwrap_or_default().to_string(),
        message: resolved.message.clone(),
        created_at: resolved.authored_at,
    }
}

/// Closed means `state == "closed"` or merged; `locked` is reported on its own.
pub fn pull_request(api: ApiPullRequest) -> PullRequest {
    let is_merged = api.merged_at.is_some();
    PullRequest {
        id: api.id,
        number: api.number,
        title: api.title.unwrap_or_default(),
        source_branch: api.head.ref_name,
        target_branch: api.base.ref_name,
        is_closed: api.state.as_deref() == Some("closed") || is_merged,
        is_merged,
        is_locked: api.locked.unwrap_or_default(),
        link: api.html_url.unwrap_or_default(),
    }
}

pub fn issue(api: ApiIssue) -> Issue {
    let resolved_pull_request_link = api
        .pull_request
        .and_then(|links| links.html_url.or(links.url))
        .unwrap_or_default();
    Issue {
        number: api.number,
        title: api.title.unwrap_or_default(),
        is_closed: api.state.as_deref() == Some("closed"),
        is_locked: api.locked.unwrap_or_default(),
        resolved_pull_request_link,
        created_at: api.created_at.unwrap_or_default(),
        updated_at: api.updated_at.unwrap_or_default(),
    }
}

/// Tag listing entry, its release (if any) and the commit it points at.
pub fn tag(api: &ApiTag, release: Option<&ApiRelease>, target: &CommitRef) -> Tag {
    let created_at = release
        .and_then(|r| r.published_at.or(r.created_at))
        .unwrap_or(target.authored_at);
    Tag {
        title: api.name.clone(),
        hash: target.hash.clone(),
        description: release
            .and_then(|r| r.body.clone())
            .unwrap_or_default(),
        zip_link: api.zipball_url.clone().unwrap_or_default(),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Oid;
    use crate::forge::schema::{ApiIssuePullLinks, ApiPullRef};
    use chrono::{DateTime, TimeZone, Utc};

    fn commit_ref(message: &str) -> CommitRef {
        CommitRef {
            hash: Oid::new("a".repeat(40)).unwrap(),
            message: message.to_string(),
            authored_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            parents: Vec::new(),
        }
    }

    #[test]
    fn shares_follow_byte_counts() {
        let languages: ApiLanguages = [("Go".to_string(), 900), ("Python".to_string(), 100)]
            .into_iter()
            .collect();
        let shares = language_shares(&languages);

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Go");
        assert!((shares[0].share - 0.9).abs() < 1e-9);
        assert_eq!(shares[1].name, "Python");
        assert!((shares[1].share - 0.1).abs() < 1e-9);
    }

    #[test]
    fn empty_and_zero_maps_yield_nothing() {
        assert!(language_shares(&ApiLanguages::new()).is_empty());

        let zeros: ApiLanguages = [("Rust".to_string(), 0)].into_iter().collect();
        assert!(language_shares(&zeros).is_empty());
    }

    #[test]
    fn equal_shares_sorted_by_name() {
        let languages: ApiLanguages = [("Zig".to_string(), 5), ("C".to_string(), 5)]
            .into_iter()
            .collect();
        let names: Vec<_> = language_shares(&languages)
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["C", "Zig"]);
    }

    #[test]
    fn missing_fields_become_zero_values() {
        let repo = repository(
            ApiRepository {
                name: "bare".into(),
                ..Default::default()
            },
            &ApiLanguages::new(),
        );
        assert_eq!(repo.description, "");
        assert_eq!(repo.stars_count, 0);
        assert!(!repo.is_private);
        assert_eq!(repo.last_updated, DateTime::<Utc>::default());

        let u = user(ApiUser {
            login: "ghost".into(),
            ..Default::default()
        });
        assert_eq!(u.full_name, "");
        assert_eq!(u.followers_count, 0);
    }

    #[test]
    fn pull_request_closed_from_state_not_lock() {
        let base = ApiPullRequest {
            id: 7,
            number: 3,
            head: ApiPullRef {
                ref_name: "feature".into(),
                sha: None,
            },
            base: ApiPullRef {
                ref_name: "main".into(),
                sha: None,
            },
            ..Default::default()
        };

        let locked_open = pull_request(ApiPullRequest {
            state: Some("open".into()),
            locked: Some(true),
            ..base.clone()
        });
        assert!(!locked_open.is_closed);
        assert!(locked_open.is_locked);
        assert_eq!(locked_open.source_branch, "feature");
        assert_eq!(locked_open.target_branch, "main");

        let closed = pull_request(ApiPullRequest {
            state: Some("closed".into()),
            ..base.clone()
        });
        assert!(closed.is_closed);
        assert!(!closed.is_merged);

        let merged = pull_request(ApiPullRequest {
            state: Some("open".into()),
            merged_at: Some(Utc::now()),
            ..base
        });
        assert!(merged.is_closed && merged.is_merged);
    }

    #[test]
    fn issue_links_pull_request() {
        let mapped = issue(ApiIssue {
            number: 12,
            title: Some("Crash on start".into()),
            state: Some("closed".into()),
            pull_request: Some(ApiIssuePullLinks {
                url: Some("https://api.github.com/repos/o/r/pulls/12".into()),
                html_url: Some("https://github.com/o/r/pull/12".into()),
            }),
            ..Default::default()
        });
        assert!(mapped.is_closed);
        assert!(!mapped.is_locked);
        assert_eq!(
            mapped.resolved_pull_request_link,
            "https://github.com/o/r/pull/12"
        );
    }

    #[test]
    fn commit_title_is_first_line() {
        let mapped = commit(&commit_ref("Fix parser\n\nLonger explanation."));
        assert_eq!(mapped.title, "Fix parser");
        assert_eq!(mapped.message, "Fix parser\n\nLonger explanation.");
        assert_eq!(commit(&commit_ref("")).title, "");
    }

    #[test]
    fn tag_prefers_release_then_commit_date() {
        let target = commit_ref("release commit");
        let listing = ApiTag {
            name: "v1.0.0".into(),
            zipball_url: Some("https://api.github.com/repos/o/r/zipball/v1.0.0".into()),
            ..Default::default()
        };

        let bare = tag(&listing, None, &target);
        assert_eq!(bare.description, "");
        assert_eq!(bare.created_at, target.authored_at);
        assert_eq!(bare.hash, target.hash);
        assert!(bare.zip_link.ends_with("zipball/v1.0.0"));

        let published = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let release = ApiRelease {
            tag_name: "v1.0.0".into(),
            body: Some("First stable release".into()),
            published_at: Some(published),
            ..Default::default()
        };
        let released = tag(&listing, Some(&release), &target);
        assert_eq!(released.description, "First stable release");
        assert_eq!(released.created_at, published);
    }
}
