//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Project with `manifest` and the sample installed-package tree
    pub fn with_manifest(manifest: &str) -> Self {
        let project = Self::new();
        project.create_file("slimlayer.toml", manifest);
        project.create_source_tree();
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Populate `build/python` with a small installed-package tree
    pub fn create_source_tree(&self) {
        for (path, content) in SOURCE_FILES {
            self.create_file(&format!("build/python/{path}"), content);
        }
    }

    /// Run slimlayer in the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_slimlayer"));
        cmd.current_dir(self.path());
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("SLIMLAYER_PROJECT_DIR");
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute slimlayer")
    }

    /// Member names of an archive in the project
    pub fn archive_entries(&self, name: &str) -> BTreeSet<String> {
        let file = std::fs::File::open(self.dir.path().join(name)).expect("Failed to open archive");
        let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
        let mut names = BTreeSet::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).expect("Failed to read archive entry");
            if !entry.is_dir() {
                names.insert(entry.name().to_string());
            }
        }
        names
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Files of the sample source tree, relative to `build/python`
pub const SOURCE_FILES: &[(&str, &str)] = &[
    ("numpy/__init__.py", "from numpy.core import *\n"),
    ("numpy/core/__init__.py", ""),
    ("numpy/core/_multiarray_umath.so", "ELF multiarray"),
    ("numpy.libs/libopenblas.so", "ELF openblas"),
    ("scipy/__init__.py", ""),
    ("scipy/_lib.so", "ELF lib"),
    ("scipy/linalg/_flapack.so", "ELF flapack"),
    ("scipy/linalg/__init__.py", ""),
    ("six.py", "# six\n"),
];

/// Manifest with two layers over the sample source tree
pub const SAMPLE_MANIFEST: &str = r#"
[project]
name = "test-project"

[[layer]]
name = "numpy"
include = [
  { dir = "numpy", required = true },
  "numpy.libs",
  "six.py",
]

[[layer]]
name = "scipy"
archive = "scipy-layer.zip"
include = [
  { glob = "scipy/*.so" },
  { glob = "scipy/*.py" },
  { dir = "scipy-extras" },
]
"#;

/// Convert output to a string for assertions
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Convert stderr to a string for assertions
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
