// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand to tool-call translation.

use std::sync::Arc;

use mnemos_config::MnemosConfig;
use mnemos_core::MnemosError;
use mnemos_memory::{StoreFactory, StoreSettings, build_embedder};
use mnemos_tools::{ToolEnvelope, ToolRegistry, store_registry};
use serde_json::{Value, json};
use tracing::debug;

use crate::Commands;

/// Builds the embedder, factory, and tool registry described by `config`.
pub async fn build_registry(config: &MnemosConfig) -> Result<ToolRegistry, MnemosError> {
    let embedder = build_embedder(&config.embedding, config.store.dimension).await?;
    let root = config.store.resolved_root();
    debug!(root = %root.display(), "opening store root");
    let factory = Arc::new(StoreFactory::new(
        root,
        StoreSettings::from_config(config),
        embedder,
    ));
    Ok(store_registry(factory))
}

/// The tool name and JSON arguments a subcommand stands for.
pub fn tool_call(command: &Commands) -> Result<(&'static str, Value), MnemosError> {
    Ok(match command {
        Commands::Users => ("list_users", json!({})),
        Commands::Stats { user } => ("get_database_stats", json!({ "user_id": user })),
        Commands::Info { user } => ("get_user_directory_info", json!({ "user_id": user })),
        Commands::Search { user, query, top_k } => (
            "search_documents",
            json!({ "user_id": user, "query": query, "top_k": top_k }),
        ),
        Commands::Add {
            user,
            text,
            metadata,
        } => {
            let mut args = json!({ "user_id": user, "document": text });
            if let Some(raw) = metadata {
                let parsed: Value = serde_json::from_str(raw).map_err(|e| {
                    MnemosError::Validation(format!("--metadata is not valid JSON: {e}"))
                })?;
                args["metadata"] = parsed;
            }
            ("add_document", args)
        }
        Commands::Delete { user, doc_id } => (
            "delete_document",
            json!({ "user_id": user, "doc_id": doc_id }),
        ),
        Commands::Export { user, path } => {
            let mut args = json!({ "user_id": user });
            if let Some(path) = path {
                args["file_path"] = Value::String(path.display().to_string());
            }
            ("save_documents_only", args)
        }
    })
}

pub async fn run(config: &MnemosConfig, command: &Commands) -> Result<ToolEnvelope, MnemosError> {
    let registry = build_registry(config).await?;
    dispatch(&registry, command).await
}

async fn dispatch(registry: &ToolRegistry, command: &Commands) -> Result<ToolEnvelope, MnemosError> {
    let (name, args) = tool_call(command)?;
    Ok(registry.dispatch_value(name, args).await)
}
