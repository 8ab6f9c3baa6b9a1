//! cli::commands::tag

use anyhow::Result;

use super::{block_on, done, render, service, Context};
use crate::cli::args::RepoSlug;
use crate::ui::output;

pub fn list(ctx: &Context, repo: &RepoSlug) -> Result<()> {
    let service = service(ctx)?;
    let tags = block_on(service.get_repository_tags(&repo.owner, &repo.repo))??;
    render(ctx, tags.as_slice(), output::format_tags)
}

pub fn create(ctx: &Context, repo: &RepoSlug, tag: &str, target: &str) -> Result<()> {
    let service = service(ctx)?;
    block_on(service.create_tag(&repo.owner, &repo.repo, tag, target))??;
    done(ctx, format!("Tagged tip of '{}' as '{}' in {}", target, tag, repo));
    Ok(())
}

pub fn delete(ctx: &Context, repo: &RepoSlug, tag: &str) -> Result<()> {
    let service = service(ctx)?;
    block_on(service.delete_tag(&repo.owner, &repo.repo, tag))??;
    done(ctx, format!("Deleted tag '{}' in {}", tag, repo));
    Ok(())
}
