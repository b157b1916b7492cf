//! Integration tests for `slimlayer build` command
//!
//! Covers directory recursion, level-only globs, optional and required rule
//! handling, layer isolation and rebuild stability.

mod common;

use common::{stderr, stdout, TestProject, SAMPLE_MANIFEST};

fn entries(names: &[&str]) -> std::collections::BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

#[test]
fn test_build_creates_all_layer_archives() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["build"]);

    assert!(
        output.status.success(),
        "build failed: {}",
        stderr(&output)
    );
    assert!(project.file_exists("dist/numpy.zip"));
    assert!(project.file_exists("dist/scipy-layer.zip"));
    assert!(stdout(&output).contains("Built 2 layers"));
}

#[test]
fn test_directory_rule_includes_whole_subtree() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["build", "--layer", "numpy"]);
    assert!(output.status.success(), "{}", stderr(&output));

    assert_eq!(
        project.archive_entries("dist/numpy.zip"),
        entries(&[
            "numpy.libs/libopenblas.so",
            "numpy/__init__.py",
            "numpy/core/__init__.py",
            "numpy/core/_multiarray_umath.so",
            "six.py",
        ])
    );
}

#[test]
fn test_glob_rule_does_not_recurse() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["build", "--layer", "scipy"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let members = project.archive_entries("dist/scipy-layer.zip");
    assert_eq!(members, entries(&["scipy/__init__.py", "scipy/_lib.so"]));
    assert!(!members.contains("scipy/linalg/_flapack.so"));
}

#[test]
fn test_recursive_glob_descends() {
    let project = TestProject::with_manifest(
        r#"
[[layer]]
name = "sos"
include = [{ glob = "scipy/*.so", recursive = true }]
"#,
    );

    let output = project.run(&["build"]);
    assert!(output.status.success(), "{}", stderr(&output));

    assert_eq!(
        project.archive_entries("dist/sos.zip"),
        entries(&["scipy/_lib.so", "scipy/linalg/_flapack.so"])
    );
}

#[test]
fn test_optional_missing_rule_warns_and_succeeds() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["build", "--layer", "scipy"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("scipy-extras"));
    assert!(stdout(&output).contains("matched nothing"));
    assert!(!project.archive_entries("dist/scipy-layer.zip").is_empty());
}

#[test]
fn test_required_missing_fails_without_archive() {
    let project = TestProject::with_manifest(
        r#"
[[layer]]
name = "torch"
include = [{ dir = "numpy" }, { dir = "torch", required = true }]
"#,
    );

    let output = project.run(&["build"]);

    assert!(!output.status.success());
    assert!(stdout(&output).contains("torch"));
    assert!(!project.file_exists("dist/torch.zip"));
}

#[test]
fn test_required_missing_keeps_previous_archive() {
    let project = TestProject::with_manifest(
        r#"
[[layer]]
name = "torch"
include = [{ dir = "torch", required = true }]
"#,
    );
    project.create_file("dist/torch.zip", "previous archive");

    let output = project.run(&["build"]);

    assert!(!output.status.success());
    assert_eq!(project.read_file("dist/torch.zip"), "previous archive");
}

#[test]
fn test_failed_layer_does_not_block_others() {
    let project = TestProject::with_manifest(
        r#"
[build]
jobs = 2

[[layer]]
name = "broken"
include = [{ file = "missing.py", required = true }]

[[layer]]
name = "six"
include = ["six.py"]
"#,
    );

    let output = project.run(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("1 of 2 layers failed"));
    assert!(project.file_exists("dist/six.zip"));
    assert!(!project.file_exists("dist/broken.zip"));
}

#[test]
fn test_rebuild_produces_identical_archive() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    assert!(project.run(&["build", "--layer", "numpy"]).status.success());
    let first = std::fs::read(project.path().join("dist/numpy.zip")).unwrap();
    assert!(project.run(&["build", "--layer", "numpy"]).status.success());
    let second = std::fs::read(project.path().join("dist/numpy.zip")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_build_does_not_modify_source_tree() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    assert!(project.run(&["build"]).status.success());

    for (path, content) in common::SOURCE_FILES {
        assert_eq!(project.read_file(&format!("build/python/{path}")), *content);
    }
}

#[test]
fn test_keep_staging_leaves_mirror() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["build", "--layer", "numpy", "--keep-staging"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(project.file_exists("build/staging/numpy/numpy/core/_multiarray_umath.so"));
    assert!(project.file_exists("build/staging/numpy/six.py"));
}

#[test]
fn test_staging_removed_after_build() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    assert!(project.run(&["build"]).status.success());

    assert!(!project.file_exists("build/staging/numpy"));
}

#[test]
fn test_prefix_places_tree_under_directory() {
    let project = TestProject::with_manifest(
        r#"
[[layer]]
name = "six"
prefix = "python"
include = ["six.py"]
"#,
    );

    assert!(project.run(&["build"]).status.success());

    assert_eq!(
        project.archive_entries("dist/six.zip"),
        entries(&["python/six.py"])
    );
}

#[test]
fn test_unknown_layer_is_error() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["build", "--layer", "pandas"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("pandas"));
}

#[test]
fn test_build_json_summary() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);

    let output = project.run(&["--json", "build"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let layers = summary.as_array().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0]["layer"], "numpy");
    assert_eq!(layers[0]["ok"], true);

    let size = &layers[0]["report"]["size"];
    let expected: u64 = common::SOURCE_FILES
        .iter()
        .filter(|(path, _)| path.starts_with("numpy") || *path == "six.py")
        .map(|(_, content)| content.len() as u64)
        .sum();
    assert_eq!(size["staged_bytes"], expected);
    assert_eq!(size["staged_files"], 5);
    assert_eq!(size["archive_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn test_budget_overrun_is_warning() {
    let project = TestProject::with_manifest(
        r#"
[build]
max_unzipped_size = "10"

[[layer]]
name = "numpy"
include = ["numpy"]
"#,
    );

    let output = project.run(&["build"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("over budget"));
    assert!(project.file_exists("dist/numpy.zip"));
}

#[test]
fn test_project_dir_flag() {
    let project = TestProject::with_manifest(SAMPLE_MANIFEST);
    let elsewhere = TestProject::new();

    let project_dir = project.path();
    let output = elsewhere.run(&["-C", project_dir.to_str().unwrap(), "build"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(project.file_exists("dist/numpy.zip"));
    assert!(!elsewhere.file_exists("dist"));
}

#[test]
fn test_missing_source_tree_is_error() {
    let project = TestProject::new();
    project.create_file("slimlayer.toml", SAMPLE_MANIFEST);

    let output = project.run(&["build"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Source tree"));
}
