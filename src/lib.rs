//! Slimlayer - Size-bounded deployment layers from installed Python packages
//!
//! This library resolves inclusion rules against a tree of installed
//! libraries, mirrors the matches into a per-layer staging area, zips each
//! staging area into an archive and reports its sizes against a budget.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Layer resolution, staging and build orchestration
//! - [`infra`] - Infrastructure layer (filesystem, archives)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
