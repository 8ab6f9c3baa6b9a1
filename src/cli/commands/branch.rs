//! cli::commands::branch
//!
//! Branch listing and mutation, and the ancestry log.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use super::{block_on, done, render, service, service_with, Context};
use crate::cli::args::{RepoSlug, WalkArgs};
use crate::history::{DuplicatePolicy, WalkOptions};
use crate::ui::output;

pub fn list(ctx: &Context, repo: &RepoSlug) -> Result<()> {
    let service = service(ctx)?;
    let branches = block_on(service.get_repository_branches(&repo.owner, &repo.repo))??;
    render(ctx, branches.as_slice(), output::format_branches)
}

pub fn create(ctx: &Context, repo: &RepoSlug, branch: &str, from: &str) -> Result<()> {
    let service = service(ctx)?;
    block_on(service.create_branch(&repo.owner, &repo.repo, branch, from))??;
    done(ctx, format!("Created branch '{}' from '{}' in {}", branch, from, repo));
    Ok(())
}

pub fn delete(ctx: &Context, repo: &RepoSlug, branch: &str) -> Result<()> {
    let service = service(ctx)?;
    block_on(service.delete_branch(&repo.owner, &repo.repo, branch))??;
    done(ctx, format!("Deleted branch '{}' in {}", branch, repo));
    Ok(())
}

/// Print the ancestry of `branch`, tip first.
pub fn log(ctx: &Context, repo: &RepoSlug, branch: &str, limits: &WalkArgs) -> Result<()> {
    let config = ctx.config()?;
    let walk = apply_limits(config.walk_options(), limits);
    let service = service_with(ctx, &config, walk)?;

    let commits = block_on(service.get_branch_commits(&repo.owner, &repo.repo, branch))??;
    info!(count = commits.len(), %repo, branch, "walked branch history");
    render(ctx, commits.as_slice(), output::format_commits)
}

/// Command-line limits override configured ones.
fn apply_limits(mut options: WalkOptions, limits: &WalkArgs) -> WalkOptions {
    if limits.dedupe {
        options.duplicates = DuplicatePolicy::DedupeByHash;
    }
    if let Some(depth) = limits.max_depth {
        options.max_depth = depth;
    }
    if let Some(count) = limits.max_commits {
        options.max_commits = count;
    }
    if let Some(secs) = limits.deadline_secs {
        options.deadline = Duration::from_secs(secs);
    }
    options
}
