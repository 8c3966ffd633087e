//! EaseCI project/pipeline registry CLI.
//!
//! # Usage
//!
//! ```text
//! easeci [--home <dir>] group add <name> [--tag <tag>] [--description <text>]
//! easeci group rm <id> [--hard]
//! easeci group rename|tag|describe <id> <value>
//! easeci project add <name> --group <id> [--tag <tag>] [--description <text>]
//! easeci project rm <id> --group <id> [--hard]
//! easeci project rename|tag|describe <id> <value>
//! easeci pipeline add --project <id> --pipeline-id <id> --name <name> --easefile <path> --pipeline-file <path>
//! easeci pipeline rm <project> <pointer>
//! easeci pipeline rename|tag|describe <project> <pointer> <value>
//! easeci tree [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{
    group::GroupCommand, pipeline::PipelineCommand, project::ProjectCommand, tree::TreeArgs,
};
use easeci_core::Registry;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "easeci",
    version,
    about = "Manage EaseCI project groups, projects and pipeline pointers",
    long_about = None,
)]
struct Cli {
    /// Directory holding `.easeci/`. Defaults to the user's home directory.
    #[arg(long, global = true, env = "EASECI_HOME", value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage project groups.
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },

    /// Manage projects inside project groups.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Manage pipeline pointers inside projects.
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },

    /// Print the whole registry.
    Tree(TreeArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let home = match cli.home {
        Some(home) => home,
        None => dirs::home_dir().context("could not determine home directory")?,
    };
    let registry = Registry::open_at(&home).with_context(|| {
        format!("failed to open registry under {}", home.display())
    })?;

    match cli.command {
        Commands::Group { command } => commands::group::run(&registry, command),
        Commands::Project { command } => commands::project::run(&registry, command),
        Commands::Pipeline { command } => commands::pipeline::run(&registry, command),
        Commands::Tree(args) => args.run(&registry),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
