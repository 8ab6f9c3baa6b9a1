//! cli::commands::repo
//!
//! Users, repositories and contributors.

use anyhow::{anyhow, Result};

use super::{block_on, done, render, service, Context};
use crate::cli::args::RepoSlug;
use crate::ui::output;

pub fn user(ctx: &Context, login: &str) -> Result<()> {
    let service = service(ctx)?;
    let user = block_on(service.get_user_info(login))??;
    render(ctx, &user, output::format_user)
}

/// List repositories of `owner`, falling back to the configured default owner.
pub fn list(ctx: &Context, owner: Option<&str>) -> Result<()> {
    let config = ctx.config()?;
    let owner = owner
        .or_else(|| config.default_owner())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No owner given and no default_owner configured."))?;

    let service = service(ctx)?;
    let repos = block_on(service.get_user_repositories(&owner))??;
    if repos.is_empty() && !ctx.json {
        output::print(format!("{} has no repositories.", owner), ctx.verbosity());
        return Ok(());
    }
    render(ctx, repos.as_slice(), output::format_repositories)
}

pub fn show(ctx: &Context, repo: &RepoSlug) -> Result<()> {
    let service = service(ctx)?;
    let repository = block_on(service.get_repository_by_name(&repo.owner, &repo.repo))??;
    render(ctx, &repository, output::format_repository)
}

pub fn create(ctx: &Context, name: &str, description: Option<&str>, private: bool) -> Result<()> {
    let service = service(ctx)?;
    let repository = block_on(service.create_repository(name, description, private))??;
    if ctx.json {
        return render(ctx, &repository, output::format_repository);
    }
    done(ctx, format!("Created repository {} ({})", repository.name, repository.link));
    Ok(())
}

pub fn contributors(ctx: &Context, repo: &RepoSlug) -> Result<()> {
    let service = service(ctx)?;
    let users = block_on(service.get_repository_contributors(&repo.owner, &repo.repo))??;
    render(ctx, users.as_slice(), output::format_users)
}
