// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a conversational-commerce backend for Instagram direct messages.
//!
//! This is the binary entry point for the Parley service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::model::ParleyConfig;

/// Parley - answers Instagram direct messages on behalf of a business.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server and dispatch engine (default).
    Serve,
    /// Validate configuration and exit.
    CheckConfig,
    /// Change per-business and per-sender switches in the database.
    Admin {
        #[command(subcommand)]
        action: admin::AdminCommand,
    },
}

fn load_config(path: Option<&PathBuf>) -> ParleyConfig {
    let result = match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::CheckConfig => {
            println!(
                "parley: config ok (agent.name={}, gateway={}:{}, database={})",
                config.agent.name,
                config.gateway.host,
                config.gateway.port,
                config.storage.database_path
            );
            Ok(())
        }
        Commands::Admin { action } => admin::run_admin(&config, action).await,
    };

    if let Err(e) = result {
        eprintln!("parley: {e}");
        std::process::exit(1);
    }
}
