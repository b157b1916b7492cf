//! Error types for slimlayer
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Manifest loading and validation errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'. Run 'slimlayer init' to create one.")]
    NotFound { path: PathBuf },

    /// Failed to read the manifest
    #[error("Failed to read manifest '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// TOML parse error
    #[error("Failed to parse manifest: {0}")]
    Parse(String),

    /// Environment substitution failed
    #[error("Failed to substitute environment variables: {0}")]
    Substitution(String),

    /// Two layers share a name
    #[error("Layer '{name}' is declared more than once")]
    DuplicateLayer { name: String },

    /// Two layers write the same archive
    #[error("Archive '{archive}' is produced by both '{first}' and '{second}'")]
    DuplicateArchive {
        archive: String,
        first: String,
        second: String,
    },

    /// Layer name unusable as a directory name
    #[error("Layer name '{name}' is invalid: {reason}")]
    InvalidLayerName { name: String, reason: String },

    /// Layer without rules
    #[error("Layer '{layer}' has no include rules")]
    EmptyRules { layer: String },

    /// Rule table names no selector
    #[error("Rule #{index} in layer '{layer}' has no selector (file, dir, path, or glob required)")]
    NoSelector { layer: String, index: usize },

    /// Rule table names several selectors
    #[error("Rule #{index} in layer '{layer}' specifies multiple selectors (only one allowed)")]
    MultipleSelectors { layer: String, index: usize },

    /// `recursive` given for a non-glob rule
    #[error("Rule #{index} in layer '{layer}': 'recursive' only applies to glob rules")]
    RecursiveOnLiteral { layer: String, index: usize },

    /// Path escapes the source tree
    #[error("Rule '{rule}' in layer '{layer}' must be a non-empty relative path without '..'")]
    UnsafePath { layer: String, rule: String },

    /// Archive prefix escapes the archive root
    #[error("Prefix '{prefix}' of layer '{layer}' must be a relative directory without '..'")]
    UnsafePrefix { layer: String, prefix: String },

    /// Invalid glob syntax
    #[error("Rule '{rule}' in layer '{layer}' is not a valid glob: {error}")]
    InvalidGlob {
        layer: String,
        rule: String,
        error: String,
    },

    /// Invalid human-readable size
    #[error("Invalid size '{value}' for '{field}': expected e.g. 512K, 50M, 1G")]
    InvalidSize { field: String, value: String },

    /// Compression level out of range
    #[error("Compression level {level} is out of range (0-9)")]
    InvalidCompressionLevel { level: i32 },

    /// Source tree missing
    #[error("Source tree '{path}' does not exist or is not a directory")]
    SourceTreeMissing { path: PathBuf },

    /// Output directory inside the staging directory
    #[error("Output directory '{output}' must not be inside the staging directory '{staging}'")]
    OutputInsideStaging { output: PathBuf, staging: PathBuf },

    /// Manifest already present
    #[error("Manifest already exists at '{path}'. Use --force to overwrite it")]
    AlreadyExists { path: PathBuf },

    /// Failed to write the manifest
    #[error("Failed to write manifest '{path}': {error}")]
    Write { path: PathBuf, error: String },

    /// Staging or output directory overlaps the source tree
    #[error("'{field}' directory '{path}' overlaps the source tree '{source_root}'")]
    OverlapsSourceTree {
        field: String,
        path: PathBuf,
        source_root: PathBuf,
    },

    /// Staging or output directory is the project directory or one of its parents
    #[error("'{field}' directory '{path}' contains the project directory")]
    ContainsProject { field: String, path: PathBuf },
}

/// Pattern resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A required rule matched nothing
    #[error("Required rule '{rule}' matched nothing under '{source_root}'")]
    RequiredMissing { rule: String, source_root: PathBuf },

    /// Glob pattern could not be compiled
    #[error("Invalid glob '{pattern}': {error}")]
    InvalidGlob { pattern: String, error: String },

    /// Non UTF-8 source root cannot be combined with a glob
    #[error("Source tree path '{path}' is not valid UTF-8")]
    NonUtf8Root { path: PathBuf },

    /// Error reading an entry while expanding a glob
    #[error("Failed to read '{path}' while resolving '{rule}': {error}")]
    Io {
        rule: String,
        path: PathBuf,
        error: String,
    },
}

/// Staging (mirror/copy) errors
#[derive(Error, Debug)]
pub enum CopyError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to walk a directory
    #[error("Failed to walk '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Archive creation errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO failure while writing the archive
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// Zip encoder failure
    #[error("Failed to write archive entry '{entry}': {error}")]
    Zip { entry: String, error: String },

    /// Moving the finished archive into place failed
    #[error("Failed to move archive into place at '{path}': {error}")]
    Persist { path: PathBuf, error: String },

    /// Archive contents differ from the staging area
    #[error("Archive '{path}' does not match staging area (missing: {missing:?}, extra: {extra:?})")]
    MembershipMismatch {
        path: PathBuf,
        missing: Vec<String>,
        extra: Vec<String>,
    },
}

/// Layer build errors
///
/// Every variant aborts the owning layer only.
#[derive(Error, Debug)]
pub enum LayerError {
    /// Resolution error
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Copy error
    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    /// Archive error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// No files were staged
    #[error("Layer '{layer}' staged no files; refusing to write an empty archive")]
    EmptyLayer { layer: String },

    /// Worker task failed
    #[error("Build task for layer '{layer}' failed: {error}")]
    Task { layer: String, error: String },
}

/// Top-level slimlayer error type
#[derive(Error, Debug)]
pub enum SlimlayerError {
    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Layer error
    #[error("Layer '{layer}' failed: {source}")]
    Layer { layer: String, source: LayerError },

    /// Filesystem error outside a layer build
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] CopyError),

    /// Unknown layer selected
    #[error("Layer '{name}' not found in manifest")]
    UnknownLayer { name: String },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
