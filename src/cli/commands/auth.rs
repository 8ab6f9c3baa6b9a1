//! cli::commands::auth
//!
//! Stores, removes and reports the GitHub personal access token.
//!
//! # Security
//!
//! Token values are never printed. `status` only reports whether a token is
//! stored and where it would come from.
//!
//! # Example
//!
//! ```bash
//! # Prompt for the token (input hidden)
//! hubkit auth login
//!
//! # Non-interactive
//! hubkit auth login --with-token ghp_xxxx
//!
//! hubkit auth status
//! hubkit auth logout
//! ```

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context as _, Result};

use super::Context;
use crate::auth::host_of;
use crate::cli::args::AuthCommand;
use crate::secrets::{self, SecretStore, GITHUB_TOKEN_KEY};
use crate::ui::output;

/// Environment variable consulted when `--token` is absent.
pub const TOKEN_ENV: &str = "HUBKIT_TOKEN";

/// Run an auth subcommand.
pub fn auth(ctx: &Context, action: AuthCommand) -> Result<()> {
    let config = ctx.config()?;
    let host = host_of(config.api_base()).to_string();
    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;

    match action {
        AuthCommand::Login { with_token } => login(ctx, store.as_ref(), &host, with_token),
        AuthCommand::Logout => logout(ctx, store.as_ref(), &host),
        AuthCommand::Status => status(ctx, store.as_ref(), &host),
    }
}

/// Token from `--token` or `$HUBKIT_TOKEN`, whichever comes first.
pub fn resolve_token(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn login(
    ctx: &Context,
    store: &dyn SecretStore,
    host: &str,
    with_token: Option<String>,
) -> Result<()> {
    let token = match with_token {
        Some(t) => t,
        None => prompt_token(ctx)?,
    };
    let token = token.trim();
    validate_token(token)?;

    store
        .set(GITHUB_TOKEN_KEY, token)
        .context("Failed to store token")?;

    super::done(ctx, format!("Authentication configured for {}.", host));
    Ok(())
}

fn logout(ctx: &Context, store: &dyn SecretStore, host: &str) -> Result<()> {
    store
        .delete(GITHUB_TOKEN_KEY)
        .context("Failed to remove stored token")?;
    super::done(ctx, format!("Logged out from {}.", host));
    Ok(())
}

fn status(ctx: &Context, store: &dyn SecretStore, host: &str) -> Result<()> {
    let stored = store.exists(GITHUB_TOKEN_KEY)?;
    let source = if ctx.token.is_some() {
        Some("--token")
    } else if std::env::var(TOKEN_ENV).is_ok() {
        Some(TOKEN_ENV)
    } else if stored {
        Some("secret store")
    } else {
        None
    };

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "host": host,
                "authenticated": source.is_some(),
                "source": source,
            })
        );
    } else if ctx.quiet {
        println!(
            "{}",
            if source.is_some() {
                "authenticated"
            } else {
                "not_authenticated"
            }
        );
    } else if let Some(source) = source {
        println!("Authenticated with {} (token from {}).", host, source);
    } else {
        println!("Not authenticated with {}.", host);
        println!("Run 'hubkit auth login' to authenticate.");
    }
    Ok(())
}

fn prompt_token(ctx: &Context) -> Result<String> {
    if ctx.quiet || !io::stdin().is_terminal() {
        bail!("Token required. Use --with-token <TOKEN> or run interactively.");
    }
    output::print("Create a token at https://github.com/settings/tokens", ctx.verbosity());
    print!("GitHub Personal Access Token: ");
    io::stdout().flush()?;
    rpassword::read_password().context("Failed to read token")
}

/// Basic format checks; the token is not verified against the API.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}
