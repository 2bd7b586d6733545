// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rosary - a recitation tracker.
//!
//! This is the binary entry point: the HTTP service plus the content and
//! demo-data seeding commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rosary_config::RosaryConfig;

/// Rosary - a recitation tracker.
#[derive(Parser, Debug)]
#[command(name = "rosary", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Load the canonical prayers, sequences and mystery sets.
    Seed,
    /// Create demo users with recent activity in several regions.
    SeedActivity,
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> RosaryConfig {
    let loaded = match path {
        Some(path) => rosary_config::load_and_validate_path(path),
        None => rosary_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            rosary_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Seed) => commands::run_seed(config).await,
        Some(Commands::SeedActivity) => commands::run_seed_activity(config).await,
        Some(Commands::CheckConfig) => {
            commands::print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("rosary: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
