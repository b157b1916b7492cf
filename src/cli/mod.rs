//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use commands::Commands;

/// Slimlayer - Size-bounded deployment layers from installed Python packages
///
/// Pick files out of an installed package tree and zip them into layers.
#[derive(Parser, Debug)]
#[command(name = "slimlayer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Project directory containing slimlayer.toml
    #[arg(
        short = 'C',
        long,
        global = true,
        value_name = "DIR",
        env = "SLIMLAYER_PROJECT_DIR"
    )]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        if let Some(cmd) = self.command {
            let project_dir = match self.project_dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            cmd.run(&project_dir).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
