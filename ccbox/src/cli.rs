// CLI argument parsing and definitions, styled after the teacher's
// `vm/src/cli` split: one `Args` struct with global flags shared across
// every subcommand, plus a `Command` enum for the few that diverge.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ccbox")]
#[command(about = "Per-project container sandbox launcher for an AI coding assistant")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Project directory to sandbox (defaults to the current directory)
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    /// Rebuild the project image instead of reusing a cached one
    #[arg(long, global = true)]
    pub fresh: bool,

    /// Skip the resource limits and capability drop policy entirely
    #[arg(long, global = true)]
    pub unrestricted: bool,

    /// Mount the project read-only
    #[arg(long = "read-only", global = true)]
    pub read_only: bool,

    /// Network policy: "full", "isolated", or a path to an isolated-mode ruleset
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Memory limit passed straight through to the engine (e.g. "4g")
    #[arg(long, global = true)]
    pub memory: Option<String>,

    /// CPU limit passed straight through to the engine (e.g. "2.0")
    #[arg(long, global = true)]
    pub cpus: Option<String>,

    /// Dependency install mode: "all", "prod", or "skip"
    #[arg(long, global = true)]
    pub deps: Option<String>,

    /// Attach to the container directly instead of entering the bridge controller
    #[arg(long = "attach-mode", global = true)]
    pub attach_mode: bool,

    /// Alias for --attach-mode: never enter the bridge controller
    #[arg(long = "no-bridge", global = true)]
    pub no_bridge: bool,

    /// Build the image and exit without starting a container
    #[arg(long, global = true)]
    pub build: bool,

    /// Equivalent to combining --attach-mode and --build's non-interactivity
    #[arg(long, global = true)]
    pub headless: bool,

    /// Remove the project's temp/cache state on exit
    #[arg(long = "zero-residue", global = true)]
    pub zero_residue: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Detect the stack, build if needed, and run a sandbox for the project (default)
    Run,
    /// Build the project's image without starting a container
    Build,
    /// Stop a running sandbox
    Stop {
        /// Container name or id (defaults to the current project's container)
        container: Option<String>,
    },
    /// Remove containers and images, optionally pruning volumes and build cache too
    Clean {
        /// Also prune volumes and the build cache
        #[arg(long)]
        deep: bool,
    },
    /// List running sandboxes
    Status,
}
