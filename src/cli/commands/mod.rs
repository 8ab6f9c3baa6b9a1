//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Builds a [`GitService`] from configuration and credentials
//! 2. Runs the service call on a tokio runtime
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Service calls are async because they involve network I/O. Each handler
//! builds a `tokio::runtime::Runtime` and blocks on the call, so the rest of
//! the CLI stays synchronous.

mod access;
mod auth;
mod branch;
mod pr;
mod repo;
mod tag;

pub use auth::{auth, resolve_token, TOKEN_ENV};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::auth::{host_of, StaticTokenProvider, StoredTokenProvider, TokenProvider};
use crate::cli::args::{
    AccessCommand, BranchCommand, Command, PrCommand, RepoCommand, TagCommand,
};
use crate::core::config::Config;
use crate::forge::GitHubForge;
use crate::history::WalkOptions;
use crate::secrets;
use crate::service::GitService;
use crate::ui::output::{self, Format, Verbosity};

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// JSON output.
    pub json: bool,
    /// Token from `--token`.
    pub token: Option<String>,
    /// API base from `--api-base`.
    pub api_base: Option<String>,
    /// Config file from `--config`.
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    pub fn format(&self) -> Format {
        Format::from_flag(self.json)
    }

    /// Load configuration, applying the `--api-base` override.
    pub fn config(&self) -> Result<Config> {
        let mut config = match &self.config_path {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load().context("Failed to load configuration")?,
        };
        if let Some(api_base) = &self.api_base {
            config.global.api_base = Some(api_base.clone());
            config.global.validate().context("Invalid --api-base")?;
        }
        if let Some(path) = config.loaded_from() {
            debug!(path = %path.display(), "loaded configuration");
        }
        Ok(config)
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Auth(action) => auth::auth(ctx, action),

        Command::User { user } => repo::user(ctx, &user),
        Command::Repo(RepoCommand::List { owner }) => repo::list(ctx, owner.as_deref()),
        Command::Repo(RepoCommand::Show { repo }) => repo::show(ctx, &repo),
        Command::Repo(RepoCommand::Create {
            name,
            description,
            private,
        }) => repo::create(ctx, &name, description.as_deref(), private),
        Command::Contributors { repo } => repo::contributors(ctx, &repo),

        Command::Branch(BranchCommand::List { repo }) => branch::list(ctx, &repo),
        Command::Branch(BranchCommand::Create { repo, branch, from }) => {
            branch::create(ctx, &repo, &branch, &from)
        }
        Command::Branch(BranchCommand::Delete { repo, branch }) => {
            branch::delete(ctx, &repo, &branch)
        }
        Command::Log {
            repo,
            branch,
            limits,
        } => branch::log(ctx, &repo, &branch, &limits),

        Command::Pr(PrCommand::List { repo, state }) => pr::list(ctx, &repo, state),
        Command::Pr(PrCommand::Create {
            repo,
            source,
            target,
            title,
            body,
        }) => pr::create(ctx, &repo, &source, &target, &title, body.as_deref()),
        Command::Pr(PrCommand::Threads { repo, number }) => pr::threads(ctx, &repo, number),
        Command::Issues { repo, state } => pr::issues(ctx, &repo, state),

        Command::Tag(TagCommand::List { repo }) => tag::list(ctx, &repo),
        Command::Tag(TagCommand::Create { repo, tag, target }) => {
            tag::create(ctx, &repo, &tag, &target)
        }
        Command::Tag(TagCommand::Delete { repo, tag }) => tag::delete(ctx, &repo, &tag),

        Command::Access(AccessCommand::Grant { repo, user }) => access::grant(ctx, &repo, &user),
        Command::Access(AccessCommand::Revoke { repo, user }) => {
            access::revoke(ctx, &repo, &user)
        }
    }
}

/// Build the token provider for `config`.
///
/// Precedence: `--token`, then `$HUBKIT_TOKEN`, then the secret store.
pub(crate) fn token_provider(ctx: &Context, config: &Config) -> Result<Arc<dyn TokenProvider>> {
    let host = host_of(config.api_base()).to_string();

    if let Some(token) = resolve_token(ctx.token.as_deref()) {
        debug!(%host, "using token from command line or environment");
        let provider = StaticTokenProvider::new(host, token).context("Invalid token")?;
        return Ok(Arc::new(provider));
    }

    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;
    Ok(Arc::new(StoredTokenProvider::new(host, store)))
}

/// Build a service over an already loaded configuration.
pub(crate) fn service_with(
    ctx: &Context,
    config: &Config,
    walk: WalkOptions,
) -> Result<GitService> {
    let tokens = token_provider(ctx, config)?;
    let forge =
        GitHubForge::new(config.forge_config(), tokens).context("Failed to create HTTP client")?;
    Ok(GitService::new(Arc::new(forge), walk))
}

pub(crate) fn service(ctx: &Context) -> Result<GitService> {
    let config = ctx.config()?;
    service_with(ctx, &config, config.walk_options())
}

/// Run a future to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    Ok(rt.block_on(future))
}

/// Print `value` as JSON or through `human`.
pub(crate) fn render<T: serde::Serialize + ?Sized>(
    ctx: &Context,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<()> {
    output::emit(value, ctx.format(), ctx.verbosity(), human).context("Failed to encode output")
}

/// Report a completed mutation.
pub(crate) fn done(ctx: &Context, message: impl std::fmt::Display) {
    if ctx.json {
        println!("{}", serde_json::json!({ "ok": true, "message": message.to_string() }));
    } else {
        output::success(message, ctx.verbosity());
    }
}
