//! Clean logic
//!
//! Removes the staging and output directories of a project. Directories
//! that hold the project itself or overlap the source tree are refused.

use std::path::PathBuf;

use crate::core::project::Project;
use crate::error::{ManifestError, SlimlayerError};
use crate::infra::filesystem::{absolute_path, paths_overlap, remove_dir_all};

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Directories that were removed
    pub removed: Vec<PathBuf>,
    /// Directories that didn't exist (skipped)
    pub skipped: Vec<PathBuf>,
}

/// Directories `clean` would remove, with the manifest field naming them
fn clean_targets(project: &Project) -> Result<Vec<(&'static str, PathBuf)>, SlimlayerError> {
    let source_root = absolute_path(&project.source_root())?;
    let mut targets = Vec::new();

    for (field, dir) in [
        ("staging_dir", project.staging_dir()),
        ("output_dir", project.output_dir()),
    ] {
        let path = absolute_path(&dir)?;
        if project.root.starts_with(&path) {
            return Err(ManifestError::ContainsProject {
                field: field.to_string(),
                path,
            }
            .into());
        }
        if paths_overlap(&path, &source_root) {
            return Err(ManifestError::OverlapsSourceTree {
                field: field.to_string(),
                path,
                source_root,
            }
            .into());
        }
        targets.push((field, path));
    }

    Ok(targets)
}

/// Remove the staging and output directories if they exist
pub fn clean_project(project: &Project) -> Result<CleanResult, SlimlayerError> {
    let mut result = CleanResult::default();

    for (field, dir) in clean_targets(project)? {
        if dir.exists() {
            tracing::info!("Removing {field} '{}'", dir.display());
            remove_dir_all(&dir)?;
            result.removed.push(dir);
        } else {
            result.skipped.push(dir);
        }
    }

    Ok(result)
}

/// Check if a project has any build artifacts
pub fn has_build_artifacts(project: &Project) -> bool {
    [project.staging_dir(), project.output_dir()]
        .iter()
        .any(|dir| dir.exists())
}
