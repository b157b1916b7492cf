//! Filesystem operations
//!
//! Handles file and directory operations used while staging layers.

use std::path::{Component, Path, PathBuf};

use crate::error::CopyError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), CopyError> {
    std::fs::create_dir_all(path).map_err(|e| CopyError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), CopyError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| CopyError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Copy a single file, creating parent directories and overwriting `to`.
///
/// Returns the number of bytes copied.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64, CopyError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(from, to).map_err(|e| CopyError::CopyFile {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    })
}

/// Archive-style name of a relative path: normal components joined by `/`.
///
/// Returns `None` for paths with non UTF-8 components or no normal
/// components at all.
pub fn relative_name(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Whether a manifest path stays inside whatever root it is joined to
pub fn is_contained_relative(path: &Path) -> bool {
    let mut has_normal = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => has_normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    has_normal
}

/// Absolute, symlink-resolved form of `path`, which need not exist yet.
///
/// The deepest existing ancestor is canonicalized and the remaining
/// components are appended lexically.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = path.as_path();
    let mut rest = Vec::new();
    loop {
        if existing.exists() {
            break;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in rest.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Whether two absolute paths are nested in either direction
pub fn paths_overlap(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
