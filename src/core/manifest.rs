//! Manifest (slimlayer.toml) parsing and validation
//!
//! The manifest is the static configuration of a slimlayer project: where
//! the installed libraries live, where staging areas and archives go, and
//! which rules make up each layer. String values support `${VAR}`
//! environment substitution.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::layer::Layer;
use crate::core::resolver::validate_pattern;
use crate::core::rule::{has_wildcard, is_safe_target, InclusionRule, RuleKind};
use crate::core::size::{parse_size, SizeBudget};
use crate::error::ManifestError;

/// The project manifest (slimlayer.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Project configuration
    #[serde(default)]
    pub project: ProjectConfig,

    /// Source tree configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Build configuration
    #[serde(default)]
    pub build: BuildConfig,

    /// Layer definitions, in declaration order
    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerConfig>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            description: None,
        }
    }
}

/// Where the fully installed libraries live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Source tree root, relative to the project directory
    #[serde(default = "default_source_root")]
    pub root: String,
}

fn default_source_root() -> String {
    defaults::DEFAULT_SOURCE_ROOT.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
        }
    }
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Parent directory of the per-layer staging areas
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Directory receiving the archives
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Deflate level, 0-9
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,

    /// Budget for the uncompressed layer
    #[serde(default = "default_max_unzipped_size")]
    pub max_unzipped_size: String,

    /// Budget for the archive
    #[serde(default = "default_max_archive_size")]
    pub max_archive_size: String,

    /// Keep staging areas after archiving
    #[serde(default)]
    pub keep_staging: bool,

    /// Number of layers built concurrently
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_staging_dir() -> String {
    defaults::DEFAULT_STAGING_DIR.to_string()
}

fn default_output_dir() -> String {
    defaults::DEFAULT_OUTPUT_DIR.to_string()
}

fn default_compression_level() -> i32 {
    defaults::DEFAULT_COMPRESSION_LEVEL
}

fn default_max_unzipped_size() -> String {
    defaults::DEFAULT_MAX_UNZIPPED_SIZE.to_string()
}

fn default_max_archive_size() -> String {
    defaults::DEFAULT_MAX_ARCHIVE_SIZE.to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            output_dir: default_output_dir(),
            compression_level: default_compression_level(),
            max_unzipped_size: default_max_unzipped_size(),
            max_archive_size: default_max_archive_size(),
            keep_staging: false,
            jobs: None,
        }
    }
}

impl BuildConfig {
    /// Parse the size strings into a budget
    pub fn budget(&self) -> Result<SizeBudget, ManifestError> {
        let parse = |field: &str, value: &str| {
            parse_size(value).ok_or_else(|| ManifestError::InvalidSize {
                field: field.to_string(),
                value: value.to_string(),
            })
        };
        Ok(SizeBudget {
            max_unzipped: parse("max_unzipped_size", &self.max_unzipped_size)?,
            max_archive: parse("max_archive_size", &self.max_archive_size)?,
        })
    }
}

/// One `[[layer]]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerConfig {
    /// Layer name; also names its staging directory
    pub name: String,

    /// Archive file name, default `<name>.zip`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,

    /// Directory inside the archive holding the staged tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Inclusion rules, in order
    #[serde(default)]
    pub include: Vec<RuleEntry>,
}

/// A rule as written in the manifest: a bare string or a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RuleEntry {
    /// `"numpy"` or `"scipy/*.so"`; always optional and non-recursive
    Short(String),
    /// `{ glob = "scipy/*.so", recursive = true, required = true }`
    Table(RuleSpec),
}

/// Table form of a rule. Exactly one selector must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Literal file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Literal directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Literal path of either kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Glob pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,

    /// Zero matches is fatal
    #[serde(default)]
    pub required: bool,

    /// Glob only: match the final component at every level below
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

impl RuleEntry {
    /// Convert to a validated rule.
    ///
    /// `index` is the 1-based position in the layer, used in errors.
    pub fn to_rule(&self, layer: &str, index: usize) -> Result<InclusionRule, ManifestError> {
        let rule = match self {
            Self::Short(text) if has_wildcard(text) => InclusionRule::glob(text.clone()),
            Self::Short(text) => InclusionRule::path(text.clone()),
            Self::Table(spec) => spec.to_rule(layer, index)?,
        };

        let target = rule.target();
        if !is_safe_target(&target) {
            return Err(ManifestError::UnsafePath {
                layer: layer.to_string(),
                rule: target,
            });
        }
        if let RuleKind::Glob { pattern, .. } = &rule.kind {
            validate_pattern(pattern).map_err(|e| ManifestError::InvalidGlob {
                layer: layer.to_string(),
                rule: pattern.clone(),
                error: e.to_string(),
            })?;
        }
        Ok(rule)
    }
}

impl RuleSpec {
    fn to_rule(&self, layer: &str, index: usize) -> Result<InclusionRule, ManifestError> {
        let selectors = [&self.file, &self.dir, &self.path, &self.glob]
            .iter()
            .filter(|s| s.is_some())
            .count();
        if selectors == 0 {
            return Err(ManifestError::NoSelector {
                layer: layer.to_string(),
                index,
            });
        }
        if selectors > 1 {
            return Err(ManifestError::MultipleSelectors {
                layer: layer.to_string(),
                index,
            });
        }
        if self.recursive.is_some() && self.glob.is_none() {
            return Err(ManifestError::RecursiveOnLiteral {
                layer: layer.to_string(),
                index,
            });
        }

        let kind = if let Some(file) = &self.file {
            RuleKind::File { path: file.into() }
        } else if let Some(dir) = &self.dir {
            RuleKind::Dir { path: dir.into() }
        } else if let Some(path) = &self.path {
            RuleKind::Path { path: path.into() }
        } else {
            RuleKind::Glob {
                pattern: self.glob.clone().unwrap_or_default(),
                recursive: self.recursive.unwrap_or(false),
            }
        };

        Ok(InclusionRule {
            kind,
            required: self.required,
        })
    }
}

impl LayerConfig {
    /// Archive file name for this layer
    pub fn archive_name(&self) -> String {
        self.archive
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.name, defaults::ARCHIVE_EXTENSION))
    }

    /// Validate and convert to a [`Layer`]
    pub fn to_layer(&self) -> Result<Layer, ManifestError> {
        validate_layer_name(&self.name)?;

        if self.include.is_empty() {
            return Err(ManifestError::EmptyRules {
                layer: self.name.clone(),
            });
        }

        let archive = self.archive_name();
        if !is_plain_file_name(&archive) {
            return Err(ManifestError::InvalidLayerName {
                name: self.name.clone(),
                reason: format!("archive name '{archive}' must be a plain file name"),
            });
        }

        let rules = self
            .include
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.to_rule(&self.name, i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Layer {
            name: self.name.clone(),
            rules,
            archive_name: archive,
            prefix: self.validated_prefix()?,
        })
    }

    /// Archive prefix with surrounding slashes removed; empty means none
    fn validated_prefix(&self) -> Result<Option<String>, ManifestError> {
        let Some(raw) = &self.prefix else {
            return Ok(None);
        };
        let prefix = raw.trim_matches('/');
        if prefix.is_empty() {
            return Ok(None);
        }
        if raw.starts_with('/') || prefix.contains('\\') || !is_safe_target(prefix) {
            return Err(ManifestError::UnsafePrefix {
                layer: self.name.clone(),
                prefix: raw.clone(),
            });
        }
        Ok(Some(prefix.to_string()))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\')
}

fn validate_layer_name(name: &str) -> Result<(), ManifestError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if !is_plain_file_name(name) {
        Some("name must not contain path separators or be '.'/'..'")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ManifestError::InvalidLayerName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

impl Manifest {
    /// Parse manifest from TOML string
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }


    /// Load manifest from file path with environment variable substitution
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let substituted =
            substitute_env_vars_in_toml(&content).map_err(ManifestError::Substitution)?;

        Self::from_toml(&substituted).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// Validate every layer and return them in declaration order.
    ///
    /// Layer names and archive names must be unique.
    pub fn layers(&self) -> Result<Vec<Layer>, ManifestError> {
        let mut archives: HashMap<String, String> = HashMap::new();
        let mut layers: Vec<Layer> = Vec::with_capacity(self.layers.len());

        for config in &self.layers {
            if layers.iter().any(|l| l.name == config.name) {
                return Err(ManifestError::DuplicateLayer {
                    name: config.name.clone(),
                });
            }
            let layer = config.to_layer()?;
            if let Some(first) = archives.get(&layer.archive_name) {
                return Err(ManifestError::DuplicateArchive {
                    archive: layer.archive_name.clone(),
                    first: first.clone(),
                    second: layer.name.clone(),
                });
            }
            archives.insert(layer.archive_name.clone(), layer.name.clone());
            layers.push(layer);
        }

        Ok(layers)
    }

    /// Check settings that do not depend on the filesystem
    pub fn validate(&self) -> Result<Vec<Layer>, ManifestError> {
        if !(0..=9).contains(&self.build.compression_level) {
            return Err(ManifestError::InvalidCompressionLevel {
                level: self.build.compression_level,
            });
        }
        self.build.budget()?;
        self.layers()
    }

    /// Source tree root for a project directory
    pub fn source_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.source.root)
    }

    /// Staging parent directory for a project directory
    pub fn staging_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.build.staging_dir)
    }

    /// Output directory for a project directory
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.build.output_dir)
    }
}

/// Substitute environment variables in a string using ${VAR} syntax.
///
/// Unset variables expand to the empty string.
///
/// # Examples
/// ```
/// use slimlayer::core::manifest::substitute_env_vars;
///
/// std::env::set_var("SLIMLAYER_DOC_VAR", "site-packages");
/// let result = substitute_env_vars("build/${SLIMLAYER_DOC_VAR}").unwrap();
/// assert_eq!(result, "build/site-packages");
/// std::env::remove_var("SLIMLAYER_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> Result<String, String> {
    let re =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| format!("Invalid regex: {e}"))?;

    let mut last_end = 0;
    let mut output = String::new();

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let var_name = &cap[1];

        output.push_str(&input[last_end..full_match.start()]);
        output.push_str(&std::env::var(var_name).unwrap_or_default());

        last_end = full_match.end();
    }

    output.push_str(&input[last_end..]);

    Ok(output)
}

/// Substitute environment variables in all string values of a TOML content.
fn substitute_env_vars_in_toml(content: &str) -> Result<String, String> {
    let mut value: toml::Value =
        toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {e}"))?;

    substitute_in_value(&mut value)?;

    toml::to_string_pretty(&value).map_err(|e| format!("Failed to serialize TOML: {e}"))
}

/// Recursively substitute environment variables in a TOML value
fn substitute_in_value(value: &mut toml::Value) -> Result<(), String> {
    match value {
        toml::Value::String(s) => {
            *s = substitute_env_vars(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_in_value(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_in_value(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}
