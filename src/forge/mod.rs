//! forge
//!
//! Provider adapter: one async method per REST endpoint the service uses.
//!
//! # Architecture
//!
//! The [`Forge`] trait is the seam between the domain layer and the wire.
//! [`GitHubForge`] talks to the real API; [`mock::MockForge`] serves the
//! same shapes from memory for tests. Response types live in [`schema`]
//! and stay provider-native; turning them into domain records is the
//! service layer's job.
//!
//! # Modules
//!
//! - `traits`: the `Forge` trait, `ForgeError` and `ForgeConfig`
//! - [`schema`]: provider-native payloads
//! - [`github`]: GitHub REST v3 implementation
//! - [`mock`]: in-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hubkit::forge::{Forge, ForgeConfig, GitHubForge};
//!
//! let forge = GitHubForge::new(ForgeConfig::default(), provider)?;
//! for branch in forge.list_branches("rust-lang", "rust").await? {
//!     println!("{}", branch.name);
//! }
//! ```

pub mod github;
pub mod mock;
pub mod schema;
mod traits;

pub use github::GitHubForge;
pub use traits::*;
