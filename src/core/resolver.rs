//! Pattern resolution
//!
//! Expands an [`InclusionRule`] against the source tree into concrete,
//! existing entries. Resolution only reads the source tree.

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::core::rule::{effective_pattern, InclusionRule, RuleKind};
use crate::error::ResolveError;

/// Type of a matched entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file (or a link to one)
    File,
    /// Directory (or a link to one); staged recursively
    Dir,
}

/// A matched entry, relative to the source tree root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ResolvedEntry {
    /// Path relative to the source tree root
    pub relative: PathBuf,
    /// Entry type at resolution time
    pub kind: EntryKind,
}

/// Outcome of resolving one rule
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// The rule that was resolved
    pub rule: InclusionRule,
    /// Sorted, de-duplicated matches
    pub entries: Vec<ResolvedEntry>,
}

impl Resolution {
    /// An optional rule that matched nothing
    pub fn is_optional_miss(&self) -> bool {
        self.entries.is_empty() && !self.rule.required
    }
}

/// Glob options: wildcards never cross `/`, dotfiles match like any name.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolve one rule against `source_root`.
///
/// Zero matches is `Ok` with no entries for optional rules and
/// [`ResolveError::RequiredMissing`] for required ones.
pub fn resolve(rule: &InclusionRule, source_root: &Path) -> Result<Resolution, ResolveError> {
    let mut entries = match &rule.kind {
        RuleKind::File { path } => {
            resolve_literal(rule, source_root, path, Some(EntryKind::File))?
        }
        RuleKind::Dir { path } => resolve_literal(rule, source_root, path, Some(EntryKind::Dir))?,
        RuleKind::Path { path } => resolve_literal(rule, source_root, path, None)?,
        RuleKind::Glob { pattern, recursive } => {
            resolve_glob(rule, source_root, &effective_pattern(pattern, *recursive))?
        }
    };

    entries.sort();
    entries.dedup_by(|a, b| a.relative == b.relative);

    if entries.is_empty() && rule.required {
        return Err(ResolveError::RequiredMissing {
            rule: rule.to_string(),
            source_root: source_root.to_path_buf(),
        });
    }

    Ok(Resolution {
        rule: rule.clone(),
        entries,
    })
}

/// Validate glob syntax without touching the filesystem
pub fn validate_pattern(pattern: &str) -> Result<(), ResolveError> {
    Pattern::new(pattern)
        .map(|_| ())
        .map_err(|e| ResolveError::InvalidGlob {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })
}

fn resolve_literal(
    rule: &InclusionRule,
    source_root: &Path,
    path: &Path,
    expected: Option<EntryKind>,
) -> Result<Vec<ResolvedEntry>, ResolveError> {
    let relative = normalize(path);
    let full = source_root.join(&relative);

    let metadata = match std::fs::metadata(&full) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ResolveError::Io {
                rule: rule.to_string(),
                path: full,
                error: e.to_string(),
            })
        }
    };

    let kind = if metadata.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::File
    };

    match expected {
        Some(expected) if expected != kind => {
            tracing::debug!(
                "Rule {rule}: '{}' exists but is a {kind:?}, not a {expected:?}",
                relative.display()
            );
            Ok(Vec::new())
        }
        _ => Ok(vec![ResolvedEntry { relative, kind }]),
    }
}

fn resolve_glob(
    rule: &InclusionRule,
    source_root: &Path,
    pattern: &str,
) -> Result<Vec<ResolvedEntry>, ResolveError> {
    let root = source_root
        .to_str()
        .ok_or_else(|| ResolveError::NonUtf8Root {
            path: source_root.to_path_buf(),
        })?;
    let full_pattern = format!(
        "{}/{}",
        Pattern::escape(root.trim_end_matches('/')),
        pattern.trim_start_matches("./")
    );

    let paths = glob::glob_with(&full_pattern, MATCH_OPTIONS).map_err(|e| {
        ResolveError::InvalidGlob {
            pattern: pattern.to_string(),
            error: e.to_string(),
        }
    })?;

    let mut entries = Vec::new();
    for path in paths {
        let path = path.map_err(|e| ResolveError::Io {
            rule: rule.to_string(),
            path: e.path().to_path_buf(),
            error: e.error().to_string(),
        })?;

        let Ok(relative) = path.strip_prefix(source_root) else {
            continue;
        };
        let relative = normalize(relative);
        if relative.as_os_str().is_empty() {
            continue;
        }

        let metadata = std::fs::metadata(&path).map_err(|e| ResolveError::Io {
            rule: rule.to_string(),
            path: path.clone(),
            error: e.to_string(),
        })?;
        let kind = if metadata.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        entries.push(ResolvedEntry { relative, kind });
    }

    Ok(entries)
}

/// Drop `.` components so equal paths compare equal
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
