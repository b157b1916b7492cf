//! Inclusion rules
//!
//! A rule selects part of the source tree for a layer. Rules are plain data:
//! the selector kind, the recursion policy for globs and whether an empty
//! match is fatal are all explicit fields rather than inferred from the
//! pattern text.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a rule selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// A single file at an exact relative path
    File { path: PathBuf },
    /// A directory and, recursively, everything below it
    Dir { path: PathBuf },
    /// An exact relative path that may be either a file or a directory
    Path { path: PathBuf },
    /// A wildcard pattern; `recursive` extends the final component's match
    /// to every directory below the pattern's level
    Glob { pattern: String, recursive: bool },
}

/// One declarative selector of a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InclusionRule {
    /// Selector
    #[serde(flatten)]
    pub kind: RuleKind,
    /// Zero matches is a fatal error when set
    pub required: bool,
}

impl InclusionRule {
    /// Optional literal file rule
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: RuleKind::File { path: path.into() },
            required: false,
        }
    }

    /// Optional directory rule
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: RuleKind::Dir { path: path.into() },
            required: false,
        }
    }

    /// Optional untyped literal rule
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: RuleKind::Path { path: path.into() },
            required: false,
        }
    }

    /// Optional, non-recursive glob rule
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Glob {
                pattern: pattern.into(),
                recursive: false,
            },
            required: false,
        }
    }

    /// Mark the rule mandatory
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark a glob rule recursive; no effect on literal rules
    #[must_use]
    pub fn recursive(mut self) -> Self {
        if let RuleKind::Glob { recursive, .. } = &mut self.kind {
            *recursive = true;
        }
        self
    }

    /// The path or pattern text as written in the manifest
    pub fn target(&self) -> String {
        match &self.kind {
            RuleKind::File { path } | RuleKind::Dir { path } | RuleKind::Path { path } => {
                path.display().to_string()
            }
            RuleKind::Glob { pattern, .. } => pattern.clone(),
        }
    }
}

impl fmt::Display for InclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RuleKind::File { path } => write!(f, "file:{}", path.display())?,
            RuleKind::Dir { path } => write!(f, "dir:{}", path.display())?,
            RuleKind::Path { path } => write!(f, "path:{}", path.display())?,
            RuleKind::Glob { pattern, recursive } => {
                write!(f, "glob:{pattern}")?;
                if *recursive {
                    write!(f, " (recursive)")?;
                }
            }
        }
        if self.required {
            write!(f, " [required]")?;
        }
        Ok(())
    }
}

/// Whether a manifest string should be read as a glob
pub fn has_wildcard(text: &str) -> bool {
    text.contains(|c: char| matches!(c, '*' | '?' | '['))
}

/// Pattern actually handed to the glob matcher.
///
/// A recursive glob gets a `**` component inserted before its final
/// component, so `pkg/*.so` also matches `pkg/sub/deep/x.so`.
pub fn effective_pattern(pattern: &str, recursive: bool) -> String {
    let trimmed = pattern.trim_end_matches('/');
    if !recursive {
        return trimmed.to_string();
    }
    match trimmed.rsplit_once('/') {
        Some((dir, name)) => format!("{dir}/**/{name}"),
        None => format!("**/{trimmed}"),
    }
}

/// Whether a rule target stays inside the source tree once joined to it
pub fn is_safe_target(target: &str) -> bool {
    crate::infra::filesystem::is_contained_relative(Path::new(target))
}
