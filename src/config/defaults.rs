//! Default configuration values

/// Manifest file name looked up in the project directory
pub const MANIFEST_FILE: &str = "slimlayer.toml";

/// Default source tree (installed libraries), relative to the project
pub const DEFAULT_SOURCE_ROOT: &str = "build/python";

/// Default parent directory for per-layer staging areas
pub const DEFAULT_STAGING_DIR: &str = "build/staging";

/// Default directory receiving the finished archives
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Default deflate level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;

/// Default number of layers built concurrently
pub const DEFAULT_BUILD_JOBS: usize = 1;

/// Unzipped size limit of a function deployment (250 MiB)
pub const DEFAULT_MAX_UNZIPPED_SIZE: &str = "250M";

/// Zipped size limit for a direct upload (50 MiB)
pub const DEFAULT_MAX_ARCHIVE_SIZE: &str = "50M";

/// Extension given to archives without an explicit name
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
