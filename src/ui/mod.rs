//! ui
//!
//! Output formatting and display for the command line.
//!
//! All output goes through [`output`] so quiet and JSON modes are honored
//! in one place.

pub mod output;
