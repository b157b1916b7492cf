//! Layer build orchestration
//!
//! Drives resolution, staging, archiving and size reporting for each layer.
//! A layer either completes fully or fails without producing an archive;
//! failures stay scoped to their layer.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::core::layer::Layer;
use crate::core::mirror::{self, StageStats};
use crate::core::resolver::{self, Resolution};
use crate::core::size::{self, format_size, SizeBudget, SizeReport};
use crate::error::{LayerError, ResolveError};
use crate::infra::{archive, filesystem};

/// Absolute paths and settings shared by every layer build
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Read-only source tree
    pub source_root: PathBuf,
    /// Parent of the per-layer staging areas
    pub staging_root: PathBuf,
    /// Directory receiving archives
    pub output_dir: PathBuf,
    /// Deflate level
    pub compression_level: i32,
    /// Size limits
    pub budget: SizeBudget,
    /// Keep staging areas after the build
    pub keep_staging: bool,
}

/// How one rule fared during a build
#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome {
    /// Rule as displayed
    pub rule: String,
    /// Whether the rule was mandatory
    pub required: bool,
    /// Number of matched entries
    pub matched: usize,
}

impl RuleOutcome {
    /// An optional rule that matched nothing
    pub fn is_optional_miss(&self) -> bool {
        self.matched == 0 && !self.required
    }
}

impl From<&Resolution> for RuleOutcome {
    fn from(resolution: &Resolution) -> Self {
        Self {
            rule: resolution.rule.to_string(),
            required: resolution.rule.required,
            matched: resolution.entries.len(),
        }
    }
}

/// Result of a successful layer build
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    /// Layer name
    pub layer: String,
    /// Archive location
    pub archive: PathBuf,
    /// Per-rule outcomes in declaration order
    pub rules: Vec<RuleOutcome>,
    /// Sizes and budget verdicts
    pub size: SizeReport,
}

impl LayerReport {
    /// Optional rules that matched nothing
    pub fn optional_misses(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.rules.iter().filter(|r| r.is_optional_miss())
    }
}

/// Result of one layer build, successful or not
#[derive(Debug)]
pub struct LayerOutcome {
    /// Layer name
    pub layer: String,
    /// Report or the error that aborted the layer
    pub result: Result<LayerReport, LayerError>,
}

/// Callback invoked as each layer finishes
pub type LayerCallback = Arc<dyn Fn(&LayerOutcome) + Send + Sync>;

/// Resolve every rule of a layer in declared order.
///
/// Optional rules with no match are logged and kept in the result; the first
/// required rule with no match aborts resolution.
pub fn resolve_layer(layer: &Layer, source_root: &Path) -> Result<Vec<Resolution>, ResolveError> {
    let mut resolutions = Vec::with_capacity(layer.rules.len());
    for rule in &layer.rules {
        let resolution = resolver::resolve(rule, source_root)?;
        if resolution.is_optional_miss() {
            tracing::warn!(
                "Layer '{}': optional rule {rule} matched nothing, skipping",
                layer.name
            );
        } else {
            tracing::info!(
                "Layer '{}': {rule} matched {} entries",
                layer.name,
                resolution.entries.len()
            );
        }
        resolutions.push(resolution);
    }
    Ok(resolutions)
}

/// Build one layer: resolve, stage, archive, report.
///
/// All rules are resolved before the staging area is touched, so a missing
/// required path aborts without side effects. Any previous archive is only
/// replaced once the new one is complete.
pub fn build_layer(ctx: &BuildContext, layer: &Layer) -> Result<LayerReport, LayerError> {
    tracing::info!("Building layer: {}", layer.name);

    let resolutions = resolve_layer(layer, &ctx.source_root)?;
    let staging = layer.staging_dir(&ctx.staging_root);

    let result = stage_and_archive(ctx, layer, &resolutions, &staging);

    if !ctx.keep_staging {
        if let Err(e) = filesystem::remove_dir_all(&staging) {
            tracing::warn!("Failed to remove staging area: {e}");
        }
    }

    let report = result?;
    tracing::info!(
        "Built layer '{}': {} files, {} staged, {} archived",
        layer.name,
        report.size.staged_files,
        format_size(report.size.staged_bytes),
        format_size(report.size.archive_bytes)
    );
    Ok(report)
}

fn stage_and_archive(
    ctx: &BuildContext,
    layer: &Layer,
    resolutions: &[Resolution],
    staging: &Path,
) -> Result<LayerReport, LayerError> {
    mirror::prepare_staging(staging)?;

    let mut copied = StageStats::default();
    for resolution in resolutions {
        for entry in &resolution.entries {
            copied += mirror::stage_entry(&ctx.source_root, staging, entry)?;
        }
    }
    tracing::debug!(
        "Layer '{}': copied {} files ({} bytes)",
        layer.name,
        copied.files,
        copied.bytes
    );

    let staged = size::scan_tree(staging)?;
    if staged.files.is_empty() {
        return Err(LayerError::EmptyLayer {
            layer: layer.name.clone(),
        });
    }

    filesystem::create_dir_all(&ctx.output_dir)?;
    let archive_path = layer.archive_path(&ctx.output_dir);
    let summary = archive::build_archive(
        staging,
        &archive_path,
        &layer.archive_options(ctx.compression_level),
    )?;

    let size = SizeReport::new(&staged, &summary, &ctx.budget);
    if size.over_unzipped_budget {
        tracing::warn!(
            "Layer '{}' is {} unzipped, over the {} budget",
            layer.name,
            format_size(size.staged_bytes),
            format_size(ctx.budget.max_unzipped)
        );
    }
    if size.over_archive_budget {
        tracing::warn!(
            "Layer '{}' archive is {}, over the {} budget",
            layer.name,
            format_size(size.archive_bytes),
            format_size(ctx.budget.max_archive)
        );
    }

    Ok(LayerReport {
        layer: layer.name.clone(),
        archive: summary.path,
        rules: resolutions.iter().map(RuleOutcome::from).collect(),
        size,
    })
}

/// Build layers with at most `jobs` running at once.
///
/// Outcomes are returned in the order of `layers`, whatever order the builds
/// finish in. A failed layer never stops the others.
pub async fn build_layers(
    ctx: Arc<BuildContext>,
    layers: Vec<Layer>,
    jobs: usize,
    on_finished: Option<LayerCallback>,
) -> Vec<LayerOutcome> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));

    let handles: Vec<_> = layers
        .into_iter()
        .map(|layer| {
            let sem = semaphore.clone();
            let ctx = ctx.clone();
            let callback = on_finished.clone();
            let name = layer.name.clone();

            let handle = tokio::spawn(async move {
                let name = layer.name.clone();
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => {
                        match tokio::task::spawn_blocking(move || build_layer(&ctx, &layer)).await
                        {
                            Ok(result) => result,
                            Err(e) => Err(LayerError::Task {
                                layer: name.clone(),
                                error: e.to_string(),
                            }),
                        }
                    }
                    Err(e) => Err(LayerError::Task {
                        layer: name.clone(),
                        error: e.to_string(),
                    }),
                };

                let outcome = LayerOutcome {
                    layer: name,
                    result,
                };
                if let Some(callback) = callback.as_deref() {
                    callback(&outcome);
                }
                outcome
            });
            (name, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => outcomes.push(LayerOutcome {
                layer: name.clone(),
                result: Err(LayerError::Task {
                    layer: name,
                    error: e.to_string(),
                }),
            }),
        }
    }
    outcomes
}
