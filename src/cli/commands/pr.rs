//! cli::commands::pr
//!
//! Pull requests, review threads and issues.

use anyhow::Result;

use super::{block_on, done, render, service, Context};
use crate::cli::args::RepoSlug;
use crate::forge::schema::ListState;
use crate::ui::output;

pub fn list(ctx: &Context, repo: &RepoSlug, state: ListState) -> Result<()> {
    let service = service(ctx)?;
    let pulls =
        block_on(service.get_repository_pull_requests(&repo.owner, &repo.repo, state))??;
    render(ctx, pulls.as_slice(), output::format_pull_requests)
}

pub fn create(
    ctx: &Context,
    repo: &RepoSlug,
    source: &str,
    target: &str,
    title: &str,
    body: Option<&str>,
) -> Result<()> {
    let service = service(ctx)?;
    let pull = block_on(service.create_pull_request(
        &repo.owner,
        &repo.repo,
        source,
        target,
        title,
        body,
    ))??;
    if ctx.json {
        return render(ctx, &pull, |_| String::new());
    }
    done(ctx, format!("Opened #{}: {}", pull.number, pull.link));
    Ok(())
}

pub fn threads(ctx: &Context, repo: &RepoSlug, number: u64) -> Result<()> {
    let service = service(ctx)?;
    let threads = block_on(service.get_threads_info(&repo.owner, &repo.repo, number))??;
    let resolved = threads.iter().filter(|t| t.is_resolved).count();
    render(ctx, threads.as_slice(), |_| {
        format!("{} of {} threads resolved", resolved, threads.len())
    })
}

pub fn issues(ctx: &Context, repo: &RepoSlug, state: ListState) -> Result<()> {
    let service = service(ctx)?;
    let issues = block_on(service.get_issues(&repo.owner, &repo.repo, state))??;
    render(ctx, issues.as_slice(), output::format_issues)
}
