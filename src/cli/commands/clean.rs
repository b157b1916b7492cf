//! CLI implementation for `slimlayer clean` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::commands::load_project;
use crate::cli::output::{print_detail, print_json, print_success, OutputConfig};
use crate::core::clean::{clean_project, has_build_artifacts};

/// Execute the clean command
pub async fn execute(path: &Path) -> Result<()> {
    let project = load_project(path)?;
    let json = OutputConfig::current().json;

    if !has_build_artifacts(&project) && !json {
        print_success("Nothing to clean");
        return Ok(());
    }

    let result = clean_project(&project).with_context(|| "Failed to clean build artifacts")?;

    if json {
        return print_json(&serde_json::json!({
            "removed": result.removed,
            "skipped": result.skipped,
        }));
    }

    if result.removed.is_empty() {
        print_success("Nothing to clean");
    } else {
        print_success("Cleaned build artifacts:");
        for dir in &result.removed {
            print_detail(&format!("Removed {}", dir.display()));
        }
    }

    Ok(())
}
