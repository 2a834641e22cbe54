// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bizchat - universal inbound message router.
//!
//! This is the binary entry point for the Bizchat server and its admin
//! commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod business;
mod serve;

use std::path::PathBuf;

use bizchat_config::BizchatConfig;
use clap::{Parser, Subcommand};

/// Bizchat - universal inbound message router.
#[derive(Parser, Debug)]
#[command(name = "bizchat", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server.
    Serve,
    /// Validate and print the effective configuration, secrets redacted.
    Config,
    /// Manage businesses.
    Business {
        #[command(subcommand)]
        action: business::BusinessCommand,
    },
}

fn load_config(path: Option<&PathBuf>) -> BizchatConfig {
    let loaded = match path {
        Some(path) => bizchat_config::load_and_validate_path(path),
        None => bizchat_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            bizchat_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn print_config(config: &BizchatConfig) -> Result<(), String> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| format!("failed to render config: {e}"))?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("bizchat: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_ref());

    let result = match command {
        Commands::Serve => serve::run_serve(config).await.map_err(|e| e.to_string()),
        Commands::Config => print_config(&config),
        Commands::Business { action } => business::run(&config, action)
            .await
            .map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
