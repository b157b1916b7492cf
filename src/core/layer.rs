//! Layer definitions
//!
//! A layer is the unit of packaging: an ordered list of rules, its own
//! staging directory and its own archive.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::rule::InclusionRule;
use crate::infra::archive::ArchiveOptions;

/// A validated layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    /// Layer name
    pub name: String,
    /// Rules in declaration order
    pub rules: Vec<InclusionRule>,
    /// Archive file name inside the output directory
    pub archive_name: String,
    /// Directory inside the archive holding the staged tree
    pub prefix: Option<String>,
}

impl Layer {
    /// Staging area of this layer under the staging parent directory.
    ///
    /// Distinct layer names give disjoint staging areas.
    pub fn staging_dir(&self, staging_root: &Path) -> PathBuf {
        staging_root.join(&self.name)
    }

    /// Archive path of this layer under the output directory
    pub fn archive_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.archive_name)
    }

    /// Archive settings for this layer
    pub fn archive_options(&self, compression_level: i32) -> ArchiveOptions {
        ArchiveOptions {
            compression_level,
            prefix: self.prefix.clone(),
        }
    }

    /// Number of required rules
    pub fn required_rules(&self) -> usize {
        self.rules.iter().filter(|r| r.required).count()
    }
}
