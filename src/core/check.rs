//! Check logic
//!
//! Resolves every rule of every layer against the source tree without
//! copying anything, and reports what a build would stage.

use serde::Serialize;
use std::path::Path;

use crate::core::layer::Layer;
use crate::core::resolver::{self, EntryKind, ResolvedEntry};
use crate::core::size;
use crate::error::CopyError;

/// Resolution result of a single rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleCheck {
    /// Rule as displayed
    pub rule: String,
    /// Whether the rule is mandatory
    pub required: bool,
    /// Matched entries, relative to the source root
    pub matches: Vec<String>,
    /// Files a build would stage for this rule
    pub files: usize,
    /// Resolution error, if any
    pub error: Option<String>,
}

impl RuleCheck {
    /// Optional rule with no matches
    pub fn is_optional_miss(&self) -> bool {
        self.error.is_none() && !self.required && self.matches.is_empty()
    }
}

/// Resolution result of a layer
#[derive(Debug, Clone, Serialize)]
pub struct LayerCheck {
    /// Layer name
    pub layer: String,
    /// Per-rule results in declaration order
    pub rules: Vec<RuleCheck>,
}

impl LayerCheck {
    /// Whether every rule resolved and could be read
    pub fn rules_resolved(&self) -> bool {
        self.rules.iter().all(|r| r.error.is_none())
    }

    /// Whether the layer would stage no files, counting through matched
    /// directories
    pub fn is_empty(&self) -> bool {
        self.rules.iter().all(|r| r.files == 0)
    }

    /// Whether a build of this layer would produce an archive
    pub fn is_valid(&self) -> bool {
        self.rules_resolved() && !self.is_empty()
    }
}

/// Resolve all rules of `layer`, collecting every failure instead of
/// stopping at the first one
pub fn check_layer(layer: &Layer, source_root: &Path) -> LayerCheck {
    let rules = layer
        .rules
        .iter()
        .map(|rule| {
            let mut check = RuleCheck {
                rule: rule.to_string(),
                required: rule.required,
                matches: Vec::new(),
                files: 0,
                error: None,
            };
            match resolver::resolve(rule, source_root) {
                Ok(resolution) => {
                    check.matches = resolution
                        .entries
                        .iter()
                        .map(|e| e.relative.to_string_lossy().into_owned())
                        .collect();
                    match count_files(source_root, &resolution.entries) {
                        Ok(files) => check.files = files,
                        Err(e) => check.error = Some(e.to_string()),
                    }
                }
                Err(e) => check.error = Some(e.to_string()),
            }
            if let Some(error) = &check.error {
                tracing::debug!("Layer '{}': {error}", layer.name);
            }
            check
        })
        .collect();

    LayerCheck {
        layer: layer.name.clone(),
        rules,
    }
}

fn count_files(source_root: &Path, entries: &[ResolvedEntry]) -> Result<usize, CopyError> {
    let mut files = 0;
    for entry in entries {
        files += match entry.kind {
            EntryKind::File => 1,
            EntryKind::Dir => size::scan_tree(&source_root.join(&entry.relative))?
                .files
                .len(),
        };
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rule::InclusionRule;
    use tempfile::TempDir;

    fn source() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("numpy/core")).unwrap();
        std::fs::write(temp.path().join("numpy/core/_multiarray.so"), "elf").unwrap();
        std::fs::write(temp.path().join("six.py"), "").unwrap();
        temp
    }

    fn layer(rules: Vec<InclusionRule>) -> Layer {
        Layer {
            name: "numpy".to_string(),
            rules,
            archive_name: "numpy.zip".to_string(),
            prefix: None,
        }
    }

    #[test]
    fn test_check_reports_matches() {
        let src = source();
        let check = check_layer(
            &layer(vec![InclusionRule::dir("numpy"), InclusionRule::glob("*.py")]),
            src.path(),
        );

        assert!(check.is_valid());
        assert!(!check.is_empty());
        assert_eq!(check.rules[0].matches, vec!["numpy".to_string()]);
        assert_eq!(check.rules[0].files, 1);
        assert_eq!(check.rules[1].matches, vec!["six.py".to_string()]);
        assert_eq!(check.rules[1].files, 1);
        assert!(!check.rules.iter().any(RuleCheck::is_optional_miss));
    }

    #[test]
    fn test_check_collects_all_failures() {
        let src = source();
        let check = check_layer(
            &layer(vec![
                InclusionRule::dir("scipy").required(),
                InclusionRule::file("six.py"),
                InclusionRule::glob("torch/*.so").required(),
            ]),
            src.path(),
        );

        assert!(!check.rules_resolved());
        assert!(!check.is_valid());
        let failures: Vec<_> = check.rules.iter().filter(|r| r.error.is_some()).collect();
        assert_eq!(failures.len(), 2);
        assert!(check.rules[1].error.is_none());
    }

    #[test]
    fn test_optional_miss_leaves_layer_empty() {
        let src = source();
        let check = check_layer(&layer(vec![InclusionRule::dir("scipy")]), src.path());

        assert!(check.rules_resolved());
        assert!(check.is_empty());
        assert!(!check.is_valid());
        assert!(check.rules[0].is_optional_miss());
    }

    #[test]
    fn test_empty_directory_match_is_empty_layer() {
        let src = source();
        std::fs::create_dir_all(src.path().join("scipy/linalg")).unwrap();
        let check = check_layer(&layer(vec![InclusionRule::dir("scipy")]), src.path());

        assert!(check.rules_resolved());
        assert_eq!(check.rules[0].matches, vec!["scipy".to_string()]);
        assert_eq!(check.rules[0].files, 0);
        assert!(check.is_empty());
        assert!(!check.is_valid());
    }

    #[test]
    fn test_check_does_not_write() {
        let src = source();
        let before: Vec<_> = walkdir::WalkDir::new(src.path())
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.path().to_path_buf())
            .collect();

        check_layer(&layer(vec![InclusionRule::dir("numpy")]), src.path());

        let after: Vec<_> = walkdir::WalkDir::new(src.path())
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.path().to_path_buf())
            .collect();
        assert_eq!(before, after);
    }
}
