//! CLI argument definitions for jinc.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "jinc",
    version,
    about = "Incremental build engine for JVM targets",
    long_about = "jinc tracks class-level dependencies between Java and Kotlin sources \
                  and recompiles only what a change can affect."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an incremental build round
    Build,

    /// Show which sources the next round would recompile
    Status,

    /// Print the committed dependency graph
    Graph,

    /// Check the committed output for consistency
    Validate,

    /// Remove the output archive and incremental state
    Clean,

    /// Rebuild whenever sources change
    Watch,

    /// Print the diagnostics recorded for recent rounds
    Diagnostics {
        /// Number of sessions to print, newest first
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
