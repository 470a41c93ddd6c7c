//! Command-line surface for the Noesis core.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Environment variable that suppresses any blocking stdin read.
pub const NON_INTERACTIVE_ENV: &str = "NOESIS_NON_INTERACTIVE";

/// Noesis: hierarchical reflective cognition orchestrator.
#[derive(Debug, Parser)]
#[command(name = "noesis", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file path (defaults to .noesis/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the default configuration file.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },

    /// Submit a query and wait for its outcome.
    Submit {
        /// Query as inline JSON, e.g. '{"kind":"semantic_lookup","payload":{"message":"..."}}'.
        query: Option<String>,

        /// Read the query JSON from a file instead.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Seed the in-process memory substrate from a JSON-lines facts
        /// file ({"key", "payload", "similarity"} per line).
        #[arg(long)]
        facts: Option<PathBuf>,
    },

    /// Show the status of a cycle from this process.
    Status {
        /// Cycle id returned by submit.
        cycle_id: String,
    },

    /// Cancel a running cycle from this process.
    Cancel {
        /// Cycle id returned by submit.
        cycle_id: String,
    },

    /// Show orchestrator statistics.
    Stats,

    /// Run one gap-resolution sweep.
    Sweep {
        /// Roadmap source (overrides configuration).
        #[arg(long)]
        roadmap: Option<PathBuf>,

        /// Context corpus (overrides configuration).
        #[arg(long)]
        contexts: Option<PathBuf>,
    },

    /// Score a candidate set with the free-energy optimizer.
    Score {
        /// File with one candidate per line, or a JSON array of strings.
        file: PathBuf,
    },
}

/// CLI failure with its process exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Initialization failure (exit code 1).
    #[error("{0}")]
    Init(#[from] anyhow::Error),

    /// Protocol violation: malformed input or missing required input
    /// (exit code 2).
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Init(_) => 1,
            Self::Protocol(_) => 2,
        }
    }
}
