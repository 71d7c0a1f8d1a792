// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - a multi-tenant messaging backend.
//!
//! This is the binary entry point for the Courier server and its
//! operator tooling.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod index;
mod serve;
mod status;

/// Courier - a multi-tenant messaging backend.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Courier server (gateway + task runner).
    Serve,
    /// Manage the full-text search index.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Report backend health and dead-letter queue state.
    Status,
}

/// Search index maintenance actions.
#[derive(Subcommand, Debug)]
enum IndexAction {
    /// Drop and recreate the index schema (destroys indexed documents).
    Setup,
    /// Recreate the index and replay every persisted message into it.
    Rebuild,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match courier_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("courier: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);
    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Index { action }) => match action {
            IndexAction::Setup => index::run_setup(&config).await,
            IndexAction::Rebuild => index::run_rebuild(&config).await,
        },
        Some(Commands::Status) => status::run_status(&config).await,
        None => {
            println!("courier: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("courier: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
