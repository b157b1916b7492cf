//! Check command implementation
//!
//! Implements `slimlayer check` to resolve every rule without building.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::cli::commands::load_project;
use crate::cli::output::{print_json, OutputConfig};
use crate::core::check::{check_layer, LayerCheck};

/// Execute the check command
pub async fn execute(project_dir: &Path, layer: Option<&str>) -> Result<()> {
    let project = load_project(project_dir)?;
    let ctx = project
        .context()
        .with_context(|| "Invalid source, staging or output directory")?;
    let layers = project.select(layer)?;

    tracing::info!("Checking project: {}", project.manifest.project.name);

    let checks: Vec<LayerCheck> = layers
        .iter()
        .map(|layer| check_layer(layer, &ctx.source_root))
        .collect();
    let failed = checks.iter().filter(|c| !c.is_valid()).count();

    let config = OutputConfig::current();
    if config.json {
        print_json(&checks)?;
    } else if !config.quiet {
        println!("Source tree: {}\n", ctx.source_root.display());
        for check in &checks {
            print_layer(check, config.verbose > 0);
        }
    }

    if failed > 0 {
        bail!("Check failed - {failed} layers would not build");
    }
    if !config.json && !config.quiet {
        println!("✓ Check passed - ready to build");
    }
    Ok(())
}

fn print_layer(check: &LayerCheck, show_matches: bool) {
    let mark = if check.is_valid() { "✓" } else { "✗" };
    println!("{mark} {}", check.layer);

    for rule in &check.rules {
        match &rule.error {
            Some(error) => println!("  ✗ {}: {error}", rule.rule),
            None if rule.matches.is_empty() => println!("  ⚠ {}: no matches", rule.rule),
            None => {
                println!(
                    "  • {}: {} matches, {} files",
                    rule.rule,
                    rule.matches.len(),
                    rule.files
                );
                if show_matches {
                    for entry in &rule.matches {
                        println!("      {entry}");
                    }
                }
            }
        }
    }

    if check.rules_resolved() && check.is_empty() {
        println!("  ✗ layer would stage no files");
    }
    println!();
}
