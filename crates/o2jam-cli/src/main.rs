mod cli;
mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use o2jam_core::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG takes precedence over -v
    let default_filter = if args.verbose {
        "o2jam=debug,o2jam_core=debug"
    } else {
        "o2jam=info,o2jam_core=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args.config.as_deref());

    match args.command {
        Command::Info { chart, json } => commands::info::run(&chart, &config, json),
        Command::Extract {
            chart,
            audio,
            output,
        } => commands::extract::run(&chart, audio.as_deref(), &output, &config),
    }
}

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    }
}
