//! Project initialization logic
//!
//! Writes a starter `slimlayer.toml` and adds the build directories to
//! `.gitignore`.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::manifest::Manifest;
use crate::error::ManifestError;

/// Entries to add to .gitignore
pub const GITIGNORE_ENTRIES: &[&str] = &["build/staging/", "dist/"];

/// Marker comment for slimlayer section in .gitignore
pub const GITIGNORE_MARKER: &str = "# slimlayer";

/// Result of initialization
#[derive(Debug)]
pub struct InitResult {
    /// Path to created manifest
    pub manifest_path: PathBuf,
    /// Whether .gitignore was created or updated
    pub gitignore_updated: bool,
    /// Project name written to the manifest
    pub project_name: String,
}

/// Generate the starter manifest content with comments
pub fn generate_manifest_content(project_name: &str) -> String {
    format!(
        r#"# slimlayer project configuration

[project]
name = "{project_name}"

[source]
# Installed packages to pick layer contents from, e.g. the output of
# `pip install --target build/python -r requirements.txt`
root = "{source_root}"

[build]
staging_dir = "{staging_dir}"
output_dir = "{output_dir}"
# Deflate level, 0 stores files uncompressed
compression_level = {compression_level}
# Size budget, exceeding it only produces a warning
max_unzipped_size = "{max_unzipped}"
max_archive_size = "{max_archive}"
# Number of layers built in parallel (0 = CPU count)
jobs = {jobs}

# One [[layer]] table per archive. Rules are resolved against the source root:
#   "numpy"                       literal file or directory, optional
#   "scipy/*.so"                  glob, this directory level only
#   {{ dir = "numpy.libs", required = true }}
#   {{ glob = "scipy/*.so", recursive = true }}
#
# [[layer]]
# name = "numpy"
# prefix = "python"
# include = [
#   {{ dir = "numpy", required = true }},
#   "numpy.libs",
#   {{ glob = "numpy-*.dist-info" }},
# ]
"#,
        source_root = defaults::DEFAULT_SOURCE_ROOT,
        staging_dir = defaults::DEFAULT_STAGING_DIR,
        output_dir = defaults::DEFAULT_OUTPUT_DIR,
        compression_level = defaults::DEFAULT_COMPRESSION_LEVEL,
        max_unzipped = defaults::DEFAULT_MAX_UNZIPPED_SIZE,
        max_archive = defaults::DEFAULT_MAX_ARCHIVE_SIZE,
        jobs = defaults::DEFAULT_BUILD_JOBS,
    )
}

/// Generate .gitignore content for slimlayer
pub fn generate_gitignore_content() -> String {
    let mut content = String::from(GITIGNORE_MARKER);
    content.push('\n');
    for entry in GITIGNORE_ENTRIES {
        content.push_str(entry);
        content.push('\n');
    }
    content
}

/// Append slimlayer entries to existing .gitignore content
pub fn append_gitignore_entries(existing: &str) -> String {
    if existing.contains(GITIGNORE_MARKER) {
        return existing.to_string();
    }

    let mut result = existing.to_string();
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    if !result.is_empty() {
        result.push('\n');
    }
    result.push_str(&generate_gitignore_content());
    result
}

/// Derive project name from directory
pub fn derive_project_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
        .unwrap_or_else(|| "my-layers".to_string())
}

fn write(path: &Path, content: &str) -> Result<(), ManifestError> {
    std::fs::write(path, content).map_err(|e| ManifestError::Write {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Initialize a project in `dir`.
///
/// Refuses to replace an existing manifest unless `force` is set.
pub fn init_project(dir: &Path, force: bool) -> Result<InitResult, ManifestError> {
    let manifest_path = dir.join(defaults::MANIFEST_FILE);
    if manifest_path.exists() && !force {
        return Err(ManifestError::AlreadyExists {
            path: manifest_path,
        });
    }

    std::fs::create_dir_all(dir).map_err(|e| ManifestError::Write {
        path: dir.to_path_buf(),
        error: e.to_string(),
    })?;

    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let project_name = derive_project_name(&resolved);
    let content = generate_manifest_content(&project_name);
    Manifest::from_toml(&content).map_err(|e| ManifestError::Parse(e.to_string()))?;
    write(&manifest_path, &content)?;
    tracing::info!("Wrote {}", manifest_path.display());

    let gitignore_path = dir.join(".gitignore");
    let existing = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path).map_err(|e| ManifestError::Read {
            path: gitignore_path.clone(),
            error: e.to_string(),
        })?
    } else {
        String::new()
    };
    let updated = append_gitignore_entries(&existing);
    let gitignore_updated = updated != existing;
    if gitignore_updated {
        write(&gitignore_path, &updated)?;
    }

    Ok(InitResult {
        manifest_path,
        gitignore_updated,
        project_name,
    })
}
