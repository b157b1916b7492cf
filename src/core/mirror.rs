//! Mirror/copy engine
//!
//! Materializes resolved entries under a staging area at the same relative
//! paths they have in the source tree. Writes never leave the staging area.

use std::path::Path;
use walkdir::WalkDir;

use crate::core::resolver::{EntryKind, ResolvedEntry};
use crate::error::CopyError;
use crate::infra::filesystem;

/// Files and bytes copied for one entry or one layer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    /// Number of files copied
    pub files: usize,
    /// Bytes copied
    pub bytes: u64,
}

impl std::ops::AddAssign for StageStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Start a staging area from scratch: remove leftovers, then create it
pub fn prepare_staging(staging: &Path) -> Result<(), CopyError> {
    filesystem::remove_dir_all(staging)?;
    filesystem::create_dir_all(staging)
}

/// Copy one resolved entry from `source_root` into `staging`.
///
/// Directories are mirrored in full, whatever rule matched them. Existing
/// files are overwritten, so staging the same entry twice is harmless.
pub fn stage_entry(
    source_root: &Path,
    staging: &Path,
    entry: &ResolvedEntry,
) -> Result<StageStats, CopyError> {
    let from = source_root.join(&entry.relative);
    let to = staging.join(&entry.relative);

    match entry.kind {
        EntryKind::File => {
            let bytes = filesystem::copy_file(&from, &to)?;
            tracing::debug!("Staged {}", entry.relative.display());
            Ok(StageStats { files: 1, bytes })
        }
        EntryKind::Dir => copy_tree(&from, &to),
    }
}

/// Recursively copy a directory tree, following symlinks
fn copy_tree(from: &Path, to: &Path) -> Result<StageStats, CopyError> {
    let mut stats = StageStats::default();
    filesystem::create_dir_all(to)?;

    for entry in WalkDir::new(from).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| CopyError::Walk {
            path: from.to_path_buf(),
            error: e.to_string(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            filesystem::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            stats.bytes += filesystem::copy_file(entry.path(), &target)?;
            stats.files += 1;
        } else {
            tracing::debug!("Skipping special file {}", entry.path().display());
        }
    }

    tracing::debug!(
        "Staged tree {} ({} files)",
        from.display(),
        stats.files
    );
    Ok(stats)
}
