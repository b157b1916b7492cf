//! Infrastructure layer
//!
//! Filesystem helpers and archive encoding.

pub mod archive;
pub mod filesystem;
