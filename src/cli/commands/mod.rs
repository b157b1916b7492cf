//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod clean;
pub mod init;
pub mod list;

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;

use crate::core::project::Project;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter slimlayer.toml
    Init {
        /// Overwrite an existing manifest
        #[arg(short, long)]
        force: bool,
    },

    /// Build layer archives
    Build {
        /// Build only the named layer
        #[arg(short, long)]
        layer: Option<String>,

        /// Number of layers built in parallel (0 = CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Keep staging areas after archiving
        #[arg(long)]
        keep_staging: bool,
    },

    /// Resolve rules without copying anything
    Check {
        /// Check only the named layer
        #[arg(short, long)]
        layer: Option<String>,
    },

    /// List layers defined in the manifest
    List,

    /// Remove staging and output directories
    Clean,
}

impl Commands {
    /// Execute the command
    pub async fn run(self, project_dir: &Path) -> Result<()> {
        match self {
            Self::Init { force } => init::execute(project_dir, force).await,
            Self::Build {
                layer,
                jobs,
                keep_staging,
            } => {
                let options = build::BuildOptions {
                    layer,
                    jobs,
                    keep_staging,
                };
                build::execute(project_dir, options).await
            }
            Self::Check { layer } => check::execute(project_dir, layer.as_deref()).await,
            Self::List => list::execute(project_dir).await,
            Self::Clean => clean::execute(project_dir).await,
        }
    }
}

/// Load the project in `project_dir` with CLI error context
pub(crate) fn load_project(project_dir: &Path) -> Result<Project> {
    Project::load(project_dir)
        .with_context(|| format!("Failed to load project in {}", project_dir.display()))
}
