//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status messages and JSON results to the user.

use std::io::IsTerminal;
use std::sync::OnceLock;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

static OUTPUT_CONFIG: OnceLock<OutputConfig> = OnceLock::new();

/// Global output settings taken from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Print machine-readable JSON on stdout
    pub json: bool,
    /// Verbosity count
    pub verbose: u8,
}

impl OutputConfig {
    /// Create a new output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Install this configuration for the rest of the process.
    ///
    /// Only the first call has an effect.
    pub fn apply_global(self) {
        let _ = OUTPUT_CONFIG.set(self);
    }

    /// The installed configuration, or the default one
    pub fn current() -> Self {
        OUTPUT_CONFIG.get().copied().unwrap_or_default()
    }

    /// Whether human-readable messages should be printed
    pub fn is_human(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Whether a progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        self.is_human() && std::io::stderr().is_terminal()
    }

    /// Log filter directive for the verbosity count
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}

/// Create a progress bar over layer builds
pub fn create_build_bar(total: u64) -> ProgressBar {
    if !OutputConfig::current().show_progress() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} layers ({msg})")
            .map(|style| style.progress_chars("█▓▒░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Print a success line
pub fn print_success(message: &str) {
    if OutputConfig::current().is_human() {
        println!("{} {message}", status::SUCCESS);
    }
}

/// Print a failure line (still shown in quiet mode)
pub fn print_failure(message: &str) {
    if !OutputConfig::current().json {
        println!("{} {message}", status::ERROR);
    }
}

/// Print a warning line
pub fn print_warning(message: &str) {
    if OutputConfig::current().is_human() {
        println!("{} {message}", status::WARNING);
    }
}

/// Print an informational line
pub fn print_info(message: &str) {
    if OutputConfig::current().is_human() {
        println!("{} {message}", status::INFO);
    }
}

/// Print an indented detail line
pub fn print_detail(message: &str) {
    if OutputConfig::current().is_human() {
        println!("  {message}");
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error and its causes on stderr
pub fn display_error(error: &anyhow::Error) {
    if OutputConfig::current().json {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": error.to_string(),
            "causes": causes,
        });
        eprintln!("{body}");
        return;
    }

    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}
