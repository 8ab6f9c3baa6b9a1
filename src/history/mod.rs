//! history
//!
//! Commit-ancestry resolution.
//!
//! - [`reference`]: loose commit pointers and their resolution
//! - [`walker`]: the ancestry walk built on top of it
//!
//! # Example
//!
//! ```ignore
//! use hubkit::history::{AncestryWalker, LooseReference, WalkOptions};
//!
//! let branch = forge.get_branch("octocat", "Hello-World", "master").await?;
//! let walker = AncestryWalker::new(&forge, WalkOptions::default());
//! let set = walker
//!     .walk(&LooseReference::branch_tip(&branch.commit), "octocat", "Hello-World")
//!     .await?;
//! for commit in set.iter() {
//!     println!("{} {}", commit.hash.short(7), commit.message);
//! }
//! ```

pub mod reference;
pub mod walker;

pub use reference::{extract_hash, fetch_commit, resolve, CommitRef, LooseReference, ResolveError};
pub use walker::{AncestrySet, AncestryWalker, DuplicatePolicy, WalkError, WalkOptions};
