//! hubkit - A typed client layer over the GitHub REST API
//!
//! hubkit turns the provider's JSON into domain records and, in particular,
//! reconstructs the full ancestry of a branch by following the loose
//! parent references GitHub hands out instead of commit objects.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to service)
//! - [`service`] - Domain-typed operations and the provider-to-domain mapper
//! - [`history`] - Loose reference resolution and the ancestry walker
//! - [`forge`] - Provider adapter trait, GitHub implementation and mock
//! - [`core`] - Strong types and configuration
//! - [`auth`] - Bearer token providers
//! - [`secrets`] - Secret storage abstraction
//! - [`ui`] - Output formatting
//!
//! # Invariants
//!
//! 1. A commit hash is only ever taken from a reference whose URL matches
//!    the expected endpoint family for the configured API base
//! 2. Ancestry walks are bounded by depth, count and wall-clock limits
//! 3. Every service failure names the operation that produced it

pub mod auth;
pub mod cli;
pub mod core;
pub mod forge;
pub mod history;
pub mod secrets;
pub mod service;
pub mod ui;
