//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging to stderr
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output
//! - `--token <TOKEN>`: Use this token instead of `$HUBKIT_TOKEN` or the stored one
//! - `--api-base <URL>`: Override the configured REST API base

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::forge::schema::ListState;

/// hubkit - typed access to GitHub repositories, branches and history
#[derive(Parser, Debug)]
#[command(name = "hubkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Personal access token for this invocation
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// REST API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Read configuration from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(RepoSlug {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(format!("expected OWNER/REPO, got '{}'", s)),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the stored GitHub token
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Show a user's profile
    User {
        /// Login name
        user: String,
    },

    /// Repositories
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Branches
    #[command(subcommand)]
    Branch(BranchCommand),

    /// Show the full commit ancestry of a branch, tip first
    #[command(
        name = "log",
        after_help = "\
EXAMPLES:
    # Every commit reachable from main
    hubkit log octocat/Hello-World main

    # Each commit once, even across merges
    hubkit log octocat/Hello-World main --dedupe"
    )]
    Log {
        repo: RepoSlug,

        branch: String,

        #[command(flatten)]
        limits: WalkArgs,
    },

    /// Pull requests
    #[command(subcommand)]
    Pr(PrCommand),

    /// List issues
    Issues {
        repo: RepoSlug,

        /// open, closed or all
        #[arg(long, default_value = "all")]
        state: ListState,
    },

    /// Tags
    #[command(subcommand)]
    Tag(TagCommand),

    /// List contributors with their profiles
    Contributors { repo: RepoSlug },

    /// Collaborator access
    #[command(subcommand)]
    Access(AccessCommand),
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Store a personal access token
    Login {
        /// Token value; prompted for when omitted
        #[arg(long = "with-token", value_name = "TOKEN")]
        with_token: Option<String>,
    },
    /// Remove the stored token
    Logout,
    /// Show whether a token is stored
    Status,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// List repositories of an owner (default: configured owner)
    List { owner: Option<String> },
    /// Show one repository
    Show { repo: RepoSlug },
    /// Create a repository for the authenticated user
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        private: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BranchCommand {
    /// List branches with their last update time
    List { repo: RepoSlug },
    /// Create a branch at the tip of another
    Create {
        repo: RepoSlug,

        branch: String,

        /// Branch whose tip the new branch starts at
        #[arg(long)]
        from: String,
    },
    /// Delete a branch
    Delete { repo: RepoSlug, branch: String },
}

#[derive(Subcommand, Debug)]
pub enum PrCommand {
    /// List pull requests
    List {
        repo: RepoSlug,

        /// open, closed or all
        #[arg(long, default_value = "all")]
        state: ListState,
    },
    /// Open a pull request
    Create {
        repo: RepoSlug,

        /// Branch with the changes
        #[arg(long)]
        source: String,

        /// Branch to merge into
        #[arg(long)]
        target: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        body: Option<String>,
    },
    /// Review thread resolution for a pull request
    Threads { repo: RepoSlug, number: u64 },
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// List tags with release notes
    List { repo: RepoSlug },
    /// Create a lightweight tag at a branch tip
    Create {
        repo: RepoSlug,

        tag: String,

        /// Branch whose tip is tagged
        #[arg(long)]
        target: String,
    },
    /// Delete a tag
    Delete { repo: RepoSlug, tag: String },
}

#[derive(Subcommand, Debug)]
pub enum AccessCommand {
    /// Invite a user as a collaborator with push access
    Grant { repo: RepoSlug, user: String },
    /// Remove a collaborator and withdraw their pending invitations
    Revoke { repo: RepoSlug, user: String },
}

/// Overrides for the configured walk limits.
#[derive(Args, Debug, Default, Clone)]
pub struct WalkArgs {
    /// Report each commit once
    #[arg(long)]
    pub dedupe: bool,

    /// Maximum parent-chain depth
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Maximum number of commits to visit
    #[arg(long, value_name = "N")]
    pub max_commits: Option<usize>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub deadline_secs: Option<u64>,
}
