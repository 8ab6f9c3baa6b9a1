//! core
//!
//! Core domain types and configuration for hubkit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, TagName, Oid, RefName
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod types;
