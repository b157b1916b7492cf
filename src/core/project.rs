//! Project loading
//!
//! Reads `slimlayer.toml` from a project directory, validates it and turns
//! its relative paths into the absolute [`BuildContext`] every operation
//! receives explicitly.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::builder::BuildContext;
use crate::core::layer::Layer;
use crate::core::manifest::Manifest;
use crate::error::{ManifestError, SlimlayerError};
use crate::infra::filesystem::{absolute_path, paths_overlap};

/// A loaded, validated project
#[derive(Debug, Clone)]
pub struct Project {
    /// Absolute project directory
    pub root: PathBuf,
    /// Parsed manifest
    pub manifest: Manifest,
    /// Validated layers in declaration order
    pub layers: Vec<Layer>,
}

impl Project {
    /// Load and validate the manifest in `dir`
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let root = absolute_path(dir).map_err(|e| ManifestError::Read {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;
        let manifest = Manifest::load(&root.join(defaults::MANIFEST_FILE))?;
        let layers = manifest.validate()?;
        Ok(Self {
            root,
            manifest,
            layers,
        })
    }

    /// Path of the manifest file
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(defaults::MANIFEST_FILE)
    }

    /// All layers, or only the named one
    pub fn select(&self, name: Option<&str>) -> Result<Vec<Layer>, SlimlayerError> {
        match name {
            None => Ok(self.layers.clone()),
            Some(name) => self
                .layers
                .iter()
                .find(|l| l.name == name)
                .map(|l| vec![l.clone()])
                .ok_or_else(|| SlimlayerError::UnknownLayer {
                    name: name.to_string(),
                }),
        }
    }

    /// Source tree root (absolute, possibly missing)
    pub fn source_root(&self) -> PathBuf {
        self.manifest.source_root(&self.root)
    }

    /// Staging parent directory (absolute, possibly missing)
    pub fn staging_dir(&self) -> PathBuf {
        self.manifest.staging_dir(&self.root)
    }

    /// Output directory (absolute, possibly missing)
    pub fn output_dir(&self) -> PathBuf {
        self.manifest.output_dir(&self.root)
    }

    /// Resolve every path and check they can be used for a build.
    ///
    /// The source tree must exist and must not overlap the staging or output
    /// directories, so staging can never write into it or wipe it.
    pub fn context(&self) -> Result<BuildContext, ManifestError> {
        let io_err = |path: &Path, e: std::io::Error| ManifestError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        };

        let source = self.source_root();
        if !source.is_dir() {
            return Err(ManifestError::SourceTreeMissing { path: source });
        }
        let source_root = source.canonicalize().map_err(|e| io_err(&source, e))?;

        let staging = self.staging_dir();
        let staging_root = absolute_path(&staging).map_err(|e| io_err(&staging, e))?;
        let output = self.output_dir();
        let output_dir = absolute_path(&output).map_err(|e| io_err(&output, e))?;

        for (field, path) in [("staging_dir", &staging_root), ("output_dir", &output_dir)] {
            if self.root.starts_with(path) {
                return Err(ManifestError::ContainsProject {
                    field: field.to_string(),
                    path: path.clone(),
                });
            }
            if paths_overlap(path, &source_root) {
                return Err(ManifestError::OverlapsSourceTree {
                    field: field.to_string(),
                    path: path.clone(),
                    source_root: source_root.clone(),
                });
            }
        }
        if output_dir.starts_with(&staging_root) {
            return Err(ManifestError::OutputInsideStaging {
                output: output_dir,
                staging: staging_root,
            });
        }

        Ok(BuildContext {
            source_root,
            staging_root,
            output_dir,
            compression_level: self.manifest.build.compression_level,
            budget: self.manifest.build.budget()?,
            keep_staging: self.manifest.build.keep_staging,
        })
    }
}
