//! cli
//!
//! Command-line interface layer for hubkit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the debug log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::service::GitService`]; rendering goes through [`crate::ui::output`].

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;
use tracing::Level;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if cli.debug {
        init_logging();
    }

    let ctx = commands::Context {
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
        token: cli.token.clone(),
        api_base: cli.api_base.clone(),
        config_path: cli.config.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Send debug-level events to stderr so they never mix with command output.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
