//! Core business logic module
//!
//! This module contains all layer packaging logic for slimlayer.
//! Encoding and low-level filesystem helpers live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`manifest`] - Manifest (slimlayer.toml) parsing and validation
//! - [`project`] - Project loading and path resolution
//! - [`rule`] - Inclusion rules
//! - [`resolver`] - Rule resolution against the source tree
//! - [`mirror`] - Staging area population
//! - [`layer`] - Layer definitions
//! - [`size`] - Size accounting and budgets
//! - [`builder`] - Layer build orchestration
//! - [`check`] - Dry-run resolution
//! - [`clean`] - Clean build artifacts logic
//! - [`init`] - Project initialization logic

pub mod builder;
pub mod check;
pub mod clean;
pub mod init;
pub mod layer;
pub mod manifest;
pub mod mirror;
pub mod project;
pub mod resolver;
pub mod rule;
pub mod size;
