//! Size accounting
//!
//! Measures staging areas and archives and compares them against the
//! platform's package-size budget. Exceeding a budget is reported, never
//! corrected.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::CopyError;
use crate::infra::archive::ArchiveSummary;
use crate::infra::filesystem::relative_name;

/// Files present under a directory
#[derive(Debug, Default, Clone)]
pub struct TreeSummary {
    /// Relative file names, `/`-separated
    pub files: BTreeSet<String>,
    /// Sum of file sizes in bytes
    pub bytes: u64,
}

/// Walk `root` and collect every file with its size
pub fn scan_tree(root: &Path) -> Result<TreeSummary, CopyError> {
    let mut summary = TreeSummary::default();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| CopyError::Walk {
            path: root.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| CopyError::Walk {
            path: entry.path().to_path_buf(),
            error: e.to_string(),
        })?;
        if let Some(name) = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(relative_name)
        {
            summary.files.insert(name);
        }
        summary.bytes += metadata.len();
    }

    Ok(summary)
}

/// Size limits a layer is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeBudget {
    /// Limit on the staged (uncompressed) size
    pub max_unzipped: u64,
    /// Limit on the archive size
    pub max_archive: u64,
}

/// Sizes of one built layer
#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    /// Files in the staging area
    pub staged_files: usize,
    /// Uncompressed bytes in the staging area
    pub staged_bytes: u64,
    /// Archive size in bytes
    pub archive_bytes: u64,
    /// Hex SHA-256 of the archive
    pub archive_sha256: String,
    /// Staged size is over budget
    pub over_unzipped_budget: bool,
    /// Archive size is over budget
    pub over_archive_budget: bool,
}

impl SizeReport {
    /// Combine the staging scan and the archive against a budget
    pub fn new(staged: &TreeSummary, archive: &ArchiveSummary, budget: &SizeBudget) -> Self {
        Self {
            staged_files: staged.files.len(),
            staged_bytes: staged.bytes,
            archive_bytes: archive.bytes,
            archive_sha256: archive.sha256.clone(),
            over_unzipped_budget: staged.bytes > budget.max_unzipped,
            over_archive_budget: archive.bytes > budget.max_archive,
        }
    }

    /// Whether any budget is exceeded
    pub fn over_budget(&self) -> bool {
        self.over_unzipped_budget || self.over_archive_budget
    }
}

/// Parse a human size such as `512K`, `50M`, `250MB`, `1G` or `1024`.
///
/// Units are binary multiples. Returns `None` for malformed input.
pub fn parse_size(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let value: u64 = digits.parse().ok()?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        _ => return None,
    };
    value.checked_mul(multiplier)
}

/// Format size for display
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        "0 bytes".to_string()
    } else if size_bytes < 1024 {
        format!("{size_bytes} bytes")
    } else if size_bytes < 1024 * 1024 {
        format!("{:.1} KB", size_bytes as f64 / 1024.0)
    } else if size_bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", size_bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", size_bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
