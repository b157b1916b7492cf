//! CLI implementation for `slimlayer init` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_json, print_success, OutputConfig};
use crate::core::init::init_project;

/// Execute the init command
pub async fn execute(path: &Path, force: bool) -> Result<()> {
    let result = init_project(path, force).with_context(|| "Failed to initialize project")?;

    if OutputConfig::current().json {
        return print_json(&serde_json::json!({
            "manifest": result.manifest_path,
            "project": result.project_name,
            "gitignore_updated": result.gitignore_updated,
        }));
    }

    print_success(&format!(
        "Initialized slimlayer project '{}' in {}",
        result.project_name,
        path.display()
    ));
    print_detail(&format!("Created {}", result.manifest_path.display()));
    if result.gitignore_updated {
        print_detail("Updated .gitignore");
    }
    print_detail("Add [[layer]] tables to the manifest, then run 'slimlayer build'");

    Ok(())
}
