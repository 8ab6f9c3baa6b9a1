//! cli::commands::access
//!
//! Collaborator access. Granting sends an invitation the user must accept;
//! revoking also withdraws invitations that are still pending.

use anyhow::Result;

use super::{block_on, done, service, Context};
use crate::cli::args::RepoSlug;

pub fn grant(ctx: &Context, repo: &RepoSlug, user: &str) -> Result<()> {
    let service = service(ctx)?;
    block_on(service.set_access_to_repository(&repo.owner, &repo.repo, user))??;
    done(ctx, format!("Invited {} to {} with push access", user, repo));
    Ok(())
}

pub fn revoke(ctx: &Context, repo: &RepoSlug, user: &str) -> Result<()> {
    let service = service(ctx)?;
    block_on(service.deny_access_to_repository(&repo.owner, &repo.repo, user))??;
    done(ctx, format!("Revoked access for {} to {}", user, repo));
    Ok(())
}
