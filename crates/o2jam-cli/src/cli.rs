//! CLI argument definitions for o2jam.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "o2jam")]
#[command(about = "O2Jam chart and audio container decoder", version)]
pub struct Args {
    /// Decode configuration (TOML)
    #[arg(short, long, value_name = "FILE", env = "O2JAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the chart header
    Info {
        /// Chart container (.ojn)
        chart: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a chart and its audio container into a directory
    Extract {
        /// Chart container (.ojn)
        chart: PathBuf,
        /// Audio container (default: chart path with .ojm extension)
        #[arg(short, long, value_name = "FILE")]
        audio: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}
