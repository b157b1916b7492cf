//! CLI implementation for `slimlayer list` command

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::cli::commands::load_project;
use crate::cli::output::{print_info, print_json, OutputConfig};

#[derive(Serialize)]
struct LayerEntry {
    name: String,
    archive: String,
    prefix: Option<String>,
    rules: Vec<String>,
    required_rules: usize,
}

/// Execute the list command
pub async fn execute(path: &Path) -> Result<()> {
    let project = load_project(path)?;
    let output_dir = project.output_dir();

    let entries: Vec<LayerEntry> = project
        .layers
        .iter()
        .map(|layer| LayerEntry {
            name: layer.name.clone(),
            archive: layer.archive_path(&output_dir).display().to_string(),
            prefix: layer.prefix.clone(),
            rules: layer.rules.iter().map(ToString::to_string).collect(),
            required_rules: layer.required_rules(),
        })
        .collect();

    let config = OutputConfig::current();
    if config.json {
        return print_json(&entries);
    }
    if config.quiet {
        return Ok(());
    }

    if entries.is_empty() {
        print_info("No layers defined in the manifest");
        return Ok(());
    }

    println!("Layers in {}:", project.manifest.project.name);
    for entry in &entries {
        println!(
            "  {} -> {} ({} rules, {} required)",
            entry.name,
            entry.archive,
            entry.rules.len(),
            entry.required_rules
        );
        if config.verbose > 0 {
            for rule in &entry.rules {
                println!("      {rule}");
            }
        }
    }

    Ok(())
}
