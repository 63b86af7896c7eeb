// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - chat turn core.
//!
//! This is the binary entry point: it inspects the context assembled for a
//! payload and prints the resolved configuration.

mod build;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::ParleyConfig;
use parley_core::ParleyError;

/// Parley - chat turn core.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the wire-format message list assembled for a payload file.
    Build {
        /// JSON document holding a chat payload.
        #[arg(long)]
        payload: PathBuf,
        /// Active plugin (e.g. `none`, `nuclei`, `auto_plugin_selector`).
        #[arg(long, default_value = "none")]
        plugin: String,
        /// Profile context injected when the chat settings allow it.
        #[arg(long)]
        profile_context: Option<String>,
    },
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Commands::Build {
            payload,
            plugin,
            profile_context,
        } => build::run_build(&config, &payload, &plugin, profile_context).await,
        Commands::Config => print_config(&config),
    };

    if let Err(e) = result {
        eprintln!("parley: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &ParleyConfig) -> Result<(), ParleyError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ParleyError::Config(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
