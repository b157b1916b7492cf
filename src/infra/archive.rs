//! Zip archive creation
//!
//! Packs a staging directory into a single zip file. The archive is written
//! to a temporary file beside the destination, checked against the staging
//! file set and only then renamed into place, so a failed build never leaves
//! a truncated archive and never clobbers the previous one.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::ArchiveError;
use crate::infra::filesystem::relative_name;

/// Archive settings for one layer
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Deflate level (0 stores entries uncompressed)
    pub compression_level: i32,
    /// Directory inside the archive that receives the staged tree
    pub prefix: Option<String>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression_level: crate::config::defaults::DEFAULT_COMPRESSION_LEVEL,
            prefix: None,
        }
    }
}

impl ArchiveOptions {
    /// Entry name of a staged file inside the archive
    pub fn entry_name(&self, relative: &str) -> String {
        match self.prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}/{relative}"),
            _ => relative.to_string(),
        }
    }

    fn file_options(&self) -> FileOptions {
        let options = FileOptions::default().last_modified_time(DateTime::default());
        if self.compression_level <= 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.compression_level))
        }
    }
}

/// A finished archive
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Final archive location
    pub path: PathBuf,
    /// Number of file entries
    pub entries: usize,
    /// Archive size in bytes
    pub bytes: u64,
    /// Hex SHA-256 of the archive file
    pub sha256: String,
}

/// Build `dest` from every file under `staging`.
///
/// Entries are written in sorted order with a fixed timestamp, so the same
/// staging tree always yields the same members and contents.
pub fn build_archive(
    staging: &Path,
    dest: &Path,
    options: &ArchiveOptions,
) -> Result<ArchiveSummary, ArchiveError> {
    let io_err = |path: &Path, e: &dyn std::fmt::Display| ArchiveError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| io_err(parent, &e))?;

    let mut expected = BTreeSet::new();
    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());
        let file_options = options.file_options();

        for entry in WalkDir::new(staging)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| io_err(staging, &e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(staging)
                .ok()
                .and_then(relative_name)
                .ok_or_else(|| ArchiveError::Zip {
                    entry: entry.path().display().to_string(),
                    error: "path is not valid UTF-8".to_string(),
                })?;
            let name = options.entry_name(&relative);

            #[cfg(unix)]
            let file_options = {
                use std::os::unix::fs::PermissionsExt;
                let mode = entry
                    .metadata()
                    .map_err(|e| io_err(entry.path(), &e))?
                    .permissions()
                    .mode();
                file_options.unix_permissions(mode)
            };

            zip.start_file(name.as_str(), file_options)
                .map_err(|e| ArchiveError::Zip {
                    entry: name.clone(),
                    error: e.to_string(),
                })?;
            let mut source = File::open(entry.path()).map_err(|e| io_err(entry.path(), &e))?;
            std::io::copy(&mut source, &mut zip).map_err(|e| ArchiveError::Zip {
                entry: name.clone(),
                error: e.to_string(),
            })?;

            tracing::debug!("Archived {name}");
            expected.insert(name);
        }

        zip.finish().map_err(|e| ArchiveError::Zip {
            entry: "<central directory>".to_string(),
            error: e.to_string(),
        })?;
    }

    let file = tmp.as_file_mut();
    file.sync_all().map_err(|e| io_err(dest, &e))?;

    file.seek(SeekFrom::Start(0)).map_err(|e| io_err(dest, &e))?;
    let members = read_entries(&mut *file, dest)?;
    verify_membership(dest, &expected, &members)?;

    file.seek(SeekFrom::Start(0)).map_err(|e| io_err(dest, &e))?;
    let mut hasher = Sha256::new();
    let bytes = std::io::copy(file, &mut hasher).map_err(|e| io_err(dest, &e))?;
    let sha256 = hex::encode(hasher.finalize());

    // Dropping the temp file on any earlier return deletes it.
    tmp.persist(dest).map_err(|e| ArchiveError::Persist {
        path: dest.to_path_buf(),
        error: e.error.to_string(),
    })?;

    Ok(ArchiveSummary {
        path: dest.to_path_buf(),
        entries: expected.len(),
        bytes,
        sha256,
    })
}

/// File entry names in an archive on disk
pub fn list_entries(path: &Path) -> Result<BTreeSet<String>, ArchiveError> {
    let file = File::open(path).map_err(|e| ArchiveError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    read_entries(file, path)
}

fn read_entries<R: std::io::Read + Seek>(
    reader: R,
    path: &Path,
) -> Result<BTreeSet<String>, ArchiveError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| ArchiveError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut names = BTreeSet::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| ArchiveError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.is_dir() {
            names.insert(entry.name().to_string());
        }
    }
    Ok(names)
}

/// Compare archive members with the expected staging file set
pub fn verify_membership(
    path: &Path,
    expected: &BTreeSet<String>,
    actual: &BTreeSet<String>,
) -> Result<(), ArchiveError> {
    if expected == actual {
        return Ok(());
    }
    Err(ArchiveError::MembershipMismatch {
        path: path.to_path_buf(),
        missing: expected.difference(actual).cloned().collect(),
        extra: actual.difference(expected).cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn staged_tree() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(staging.join("pkg/sub")).unwrap();
        std::fs::write(staging.join("pkg/a.py"), "print('a')\n").unwrap();
        std::fs::write(staging.join("pkg/sub/b.py"), "print('b')\n").unwrap();
        std::fs::write(staging.join("top.py"), "x = 1\n").unwrap();
        (temp, staging)
    }

    fn read_member(archive: &Path, name: &str) -> String {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_archive_contains_exactly_staged_files() {
        let (temp, staging) = staged_tree();
        let dest = temp.path().join("layer.zip");

        let summary = build_archive(&staging, &dest, &ArchiveOptions::default()).unwrap();

        let entries = list_entries(&dest).unwrap();
        let expected: BTreeSet<String> = ["pkg/a.py", "pkg/sub/b.py", "top.py"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(entries, expected);
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.bytes, std::fs::metadata(&dest).unwrap().len());
        assert_eq!(summary.sha256.len(), 64);
        assert_eq!(read_member(&dest, "pkg/sub/b.py"), "print('b')\n");
    }

    #[test]
    fn test_archive_prefix() {
        let (temp, staging) = staged_tree();
        let dest = temp.path().join("layer.zip");
        let options = ArchiveOptions {
            compression_level: 9,
            prefix: Some("python/".to_string()),
        };

        build_archive(&staging, &dest, &options).unwrap();

        let entries = list_entries(&dest).unwrap();
        assert!(entries.contains("python/pkg/a.py"));
        assert!(entries.iter().all(|e| e.starts_with("python/")));
    }

    #[test]
    fn test_archive_is_deterministic() {
        let (temp, staging) = staged_tree();
        let first = temp.path().join("first.zip");
        let second = temp.path().join("second.zip");

        let a = build_archive(&staging, &first, &ArchiveOptions::default()).unwrap();
        let b = build_archive(&staging, &second, &ArchiveOptions::default()).unwrap();

        assert_eq!(a.sha256, b.sha256);
    }

    #[test]
    fn test_archive_replaces_existing_file() {
        let (temp, staging) = staged_tree();
        let dest = temp.path().join("layer.zip");
        std::fs::write(&dest, "not a zip").unwrap();

        build_archive(&staging, &dest, &ArchiveOptions::default()).unwrap();

        assert_eq!(list_entries(&dest).unwrap().len(), 3);
    }

    #[test]
    fn test_stored_entries_when_level_zero() {
        let (temp, staging) = staged_tree();
        let dest = temp.path().join("layer.zip");
        let options = ArchiveOptions {
            compression_level: 0,
            prefix: None,
        };

        build_archive(&staging, &dest, &options).unwrap();

        let mut zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let entry = zip.by_name("top.py").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_failed_build_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let dest = out.join("layer.zip");

        let result = build_archive(
            &temp.path().join("missing-staging"),
            &dest,
            &ArchiveOptions::default(),
        );

        assert!(result.is_err());
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_verify_membership_reports_differences() {
        let expected: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();
        let actual: BTreeSet<String> = ["b".to_string(), "c".to_string()].into();

        let err = verify_membership(Path::new("x.zip"), &expected, &actual).unwrap_err();
        match err {
            ArchiveError::MembershipMismatch { missing, extra, .. } => {
                assert_eq!(missing, vec!["a".to_string()]);
                assert_eq!(extra, vec!["c".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
