//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, records are printed as pretty JSON on stdout
//! and human formatting is skipped entirely.

use std::fmt::Display;

use serde::Serialize;

use crate::service::{Branch, Commit, Issue, PullRequest, Repository, Tag, User};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// How records are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Format::Json
        } else {
            Format::Human
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a record in the requested format.
///
/// JSON output ignores quiet mode since it is the command's result.
pub fn emit<T: Serialize + ?Sized>(
    value: &T,
    format: Format,
    verbosity: Verbosity,
    human: impl FnOnce(&T) -> String,
) -> Result<(), serde_json::Error> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Human => {
            let text = human(value);
            if !text.is_empty() {
                print(text, verbosity);
            }
        }
    }
    Ok(())
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_user(user: &User) -> String {
    let mut line = user.user_name.clone();
    if !user.full_name.is_empty() {
        line.push_str(&format!(" ({})", user.full_name));
    }
    format!(
        "{}\n  followers: {}  following: {}",
        line, user.followers_count, user.following_count
    )
}

pub fn format_users(users: &[User]) -> String {
    let names: Vec<&str> = users.iter().map(|u| u.user_name.as_str()).collect();
    format_list(&names, "")
}

pub fn format_repository(repo: &Repository) -> String {
    let mut out = format!(
        "{}{}  stars: {}  forks: {}",
        repo.name,
        if repo.is_private { " [private]" } else { "" },
        repo.stars_count,
        repo.forks_count
    );
    if !repo.description.is_empty() {
        out.push_str(&format!("\n  {}", repo.description));
    }
    if !repo.languages.is_empty() {
        let langs: Vec<String> = repo
            .languages
            .iter()
            .map(|l| format!("{} {:.1}%", l.name, l.share * 100.0))
            .collect();
        out.push_str(&format!("\n  {}", langs.join(", ")));
    }
    out
}

pub fn format_repositories(repos: &[Repository]) -> String {
    repos
        .iter()
        .map(format_repository)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_branches(branches: &[Branch]) -> String {
    let lines: Vec<String> = branches
        .iter()
        .map(|b| format!("{}  {}", b.name, b.updated_at.format("%Y-%m-%d %H:%M")))
        .collect();
    format_list(&lines, "")
}

pub fn format_commits(commits: &[Commit]) -> String {
    let lines: Vec<String> = commits
        .iter()
        .map(|c| {
            format!(
                "{}  {}  {}",
                c.hash.short(7),
                c.created_at.format("%Y-%m-%d"),
                c.title
            )
        })
        .collect();
    format_list(&lines, "")
}

pub fn format_pull_requests(pulls: &[PullRequest]) -> String {
    let lines: Vec<String> = pulls
        .iter()
        .map(|p| {
            let state = if p.is_merged {
                "merged"
            } else if p.is_closed {
                "closed"
            } else {
                "open"
            };
            format!(
                "#{}  [{}]  {} ({} -> {})",
                p.number, state, p.title, p.source_branch, p.target_branch
            )
        })
        .collect();
    format_list(&lines, "")
}

pub fn format_issues(issues: &[Issue]) -> String {
    let lines: Vec<String> = issues
        .iter()
        .map(|i| {
            format!(
                "#{}  [{}]  {}",
                i.number,
                if i.is_closed { "closed" } else { "open" },
                i.title
            )
        })
        .collect();
    format_list(&lines, "")
}

pub fn format_tags(tags: &[Tag]) -> String {
    let lines: Vec<String> = tags
        .iter()
        .map(|t| format!("{}  {}", t.title, t.hash.short(7)))
        .collect();
    format_list(&lines, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Oid;
    use chrono::{TimeZone, Utc};

    #[test]
    fn verbosity_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn commits_use_short_hash_and_title() {
        let commits = vec![Commit {
            hash: Oid::new("a".repeat(40)).unwrap(),
            title: "fix".into(),
            message: "fix\n\nmore".into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }];
        assert_eq!(format_commits(&commits), "aaaaaaa  2024-05-01  fix");
    }

    #[test]
    fn merged_pull_request_labelled_merged() {
        let pulls = vec![PullRequest {
            id: 1,
            number: 7,
            title: "t".into(),
            source_branch: "feature".into(),
            target_branch: "main".into(),
            is_closed: true,
            is_merged: true,
            is_locked: false,
            link: String::new(),
        }];
        assert_eq!(
            format_pull_requests(&pulls),
            "#7  [merged]  t (feature -> main)"
        );
    }

    #[test]
    fn format_list_prefixes() {
        assert_eq!(format_list(&["a", "b"], "- "), "- a\n- b");
    }
}
