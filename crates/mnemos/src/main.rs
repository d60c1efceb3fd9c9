// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mnemos - per-user vector memory.
//!
//! This binary inspects and edits the per-user stores on disk. Every
//! subcommand goes through the same tool dispatcher an assistant uses and
//! prints the resulting envelope as JSON.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mnemos - per-user vector memory.
#[derive(Parser, Debug)]
#[command(name = "mnemos", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `store.root_dir`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// List users that have a saved store.
    Users,
    /// Show document count, index variant, and dimension for a user.
    Stats { user: String },
    /// Show a user's directory and file sizes.
    Info { user: String },
    /// Semantic search over a user's documents.
    Search {
        user: String,
        query: String,
        /// Number of results (1-50).
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },
    /// Add a document.
    Add {
        user: String,
        text: String,
        /// Metadata as a JSON object.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete a document by id.
    Delete { user: String, doc_id: String },
    /// Write the documents-only export.
    Export {
        user: String,
        /// Destination file; defaults to the user's directory.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => mnemos_config::load_and_validate_path(path),
        None => mnemos_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mnemos_config::render_errors(&errors);
            std::process::exit(2);
        }
    };
    if let Some(root) = &cli.root {
        config.store.root_dir = Some(root.display().to_string());
    }

    init_tracing(&config.agent.log_level);

    match commands::run(&config, &cli.command).await {
        Ok(envelope) => {
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("mnemos: failed to render result: {e}");
                    std::process::exit(1);
                }
            }
            if !envelope.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("mnemos: {e}");
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays pure JSON.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mnemos={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
