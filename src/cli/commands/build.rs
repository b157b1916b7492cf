//! Build command implementation
//!
//! Implements `slimlayer build` to stage and archive layers.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::cli::commands::load_project;
use crate::cli::output::{
    create_build_bar, print_detail, print_failure, print_json, print_success, print_warning,
    OutputConfig,
};
use crate::config::defaults::DEFAULT_BUILD_JOBS;
use crate::core::builder::{build_layers, LayerCallback, LayerOutcome, LayerReport};
use crate::core::size::format_size;
use crate::error::SlimlayerError;

/// Build options
pub struct BuildOptions {
    /// Build only the named layer
    pub layer: Option<String>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    /// Keep staging areas after archiving
    pub keep_staging: bool,
}

/// Per-layer entry of the JSON summary
#[derive(Serialize)]
struct LayerSummary {
    layer: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<LayerReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Number of concurrent layer builds: CLI, then manifest, then default.
///
/// Zero means one job per CPU. Never more jobs than layers.
pub fn effective_jobs(cli: Option<usize>, manifest: Option<usize>, layers: usize) -> usize {
    let requested = cli.or(manifest).unwrap_or(DEFAULT_BUILD_JOBS);
    let jobs = if requested == 0 {
        num_cpus::get()
    } else {
        requested
    };
    jobs.clamp(1, layers.max(1))
}

/// Execute the build command
pub async fn execute(project_dir: &Path, options: BuildOptions) -> Result<()> {
    let mut project = load_project(project_dir)?;
    if options.keep_staging {
        project.manifest.build.keep_staging = true;
    }

    let ctx = project
        .context()
        .with_context(|| "Invalid source, staging or output directory")?;
    let layers = project.select(options.layer.as_deref())?;

    if layers.is_empty() {
        print_warning("No layers defined in the manifest, nothing to build");
        return Ok(());
    }

    let jobs = effective_jobs(options.jobs, project.manifest.build.jobs, layers.len());
    tracing::info!(
        "Building {} layers of '{}' with {} jobs",
        layers.len(),
        project.manifest.project.name,
        jobs
    );

    let total = layers.len();
    let pb = create_build_bar(total as u64);
    let bar = pb.clone();
    let callback: LayerCallback = Arc::new(move |outcome: &LayerOutcome| {
        bar.set_message(outcome.layer.clone());
        bar.inc(1);
    });

    let outcomes = build_layers(Arc::new(ctx), layers, jobs, Some(callback)).await;
    pb.finish_and_clear();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

    if OutputConfig::current().json {
        let summary: Vec<LayerSummary> = outcomes.into_iter().map(summarize).collect();
        print_json(&summary)?;
    } else {
        for outcome in outcomes {
            print_outcome(&project.root, outcome);
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} layers failed to build");
    }

    print_success(&format!("Built {total} layers"));
    Ok(())
}

fn summarize(outcome: LayerOutcome) -> LayerSummary {
    match outcome.result {
        Ok(report) => LayerSummary {
            layer: outcome.layer,
            ok: true,
            report: Some(report),
            error: None,
        },
        Err(e) => LayerSummary {
            layer: outcome.layer,
            ok: false,
            report: None,
            error: Some(e.to_string()),
        },
    }
}

fn print_outcome(project_dir: &Path, outcome: LayerOutcome) {
    let report = match outcome.result {
        Ok(report) => report,
        Err(source) => {
            let error = SlimlayerError::Layer {
                layer: outcome.layer,
                source,
            };
            print_failure(&error.to_string());
            return;
        }
    };

    let archive = report
        .archive
        .strip_prefix(project_dir)
        .unwrap_or(&report.archive);
    print_success(&format!(
        "{}: {} files, {} unzipped, {} archive -> {}",
        report.layer,
        report.size.staged_files,
        format_size(report.size.staged_bytes),
        format_size(report.size.archive_bytes),
        archive.display()
    ));
    print_detail(&format!("sha256 {}", report.size.archive_sha256));
    for miss in report.optional_misses() {
        print_warning(&format!("{}: optional rule {} matched nothing", report.layer, miss.rule));
    }
    if report.size.over_unzipped_budget {
        print_warning(&format!(
            "{}: unzipped size {} is over budget",
            report.layer,
            format_size(report.size.staged_bytes)
        ));
    }
    if report.size.over_archive_budget {
        print_warning(&format!(
            "{}: archive size {} is over budget",
            report.layer,
            format_size(report.size.archive_bytes)
        ));
    }
}
