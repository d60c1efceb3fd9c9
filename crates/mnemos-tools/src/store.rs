// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store tools: document CRUD, statistics, and administrative operations.
//!
//! Every tool names its target user explicitly through `user_id`; handles
//! come from the shared [`StoreFactory`], so calls for different users never
//! touch each other's state.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::MnemosError;
use mnemos_memory::{Metadata, StoreFactory};
use serde::Deserialize;
use serde_json::json;

use crate::tool::{Tool, ToolRegistry, parse_args};

/// Largest `top_k` a search call may request.
pub const MAX_TOP_K: usize = 50;

const DEFAULT_TOP_K: usize = 5;
const PREVIEW_CHARS: usize = 100;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn user_id_schema(description: &str) -> serde_json::Value {
    json!({ "type": "string", "description": description })
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Registers all eleven store tools over `factory`.
pub fn register_store_tools(registry: &mut ToolRegistry, factory: Arc<StoreFactory>) {
    registry.register(Arc::new(AddDocumentTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(SearchDocumentsTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(UpdateDocumentTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(DeleteDocumentTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(DatabaseStatsTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(ListUsersTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(DirectoryInfoTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(SaveDocumentsOnlyTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(LoadDocumentsOnlyTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(SaveDatabaseTool::new(Arc::clone(&factory))));
    registry.register(Arc::new(LoadDatabaseTool::new(factory)));
}

/// A registry holding exactly the store tools.
pub fn store_registry(factory: Arc<StoreFactory>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_store_tools(&mut registry, factory);
    registry
}

macro_rules! store_tool {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name {
            factory: Arc<StoreFactory>,
        }

        impl $name {
            pub fn new(factory: Arc<StoreFactory>) -> Self {
                Self { factory }
            }
        }
    };
}

store_tool!(
    /// Adds a document, creating the user's database on first use.
    AddDocumentTool
);
store_tool!(
    /// Semantic search over one user's documents.
    SearchDocumentsTool
);
store_tool!(UpdateDocumentTool);
store_tool!(DeleteDocumentTool);
store_tool!(DatabaseStatsTool);
store_tool!(ListUsersTool);
store_tool!(DirectoryInfoTool);
store_tool!(
    /// Writes the `doc_id -> text` export for one user.
    SaveDocumentsOnlyTool
);
store_tool!(LoadDocumentsOnlyTool);
store_tool!(
    /// Rewrites a user's snapshot from in-memory state.
    SaveDatabaseTool
);
store_tool!(
    /// Replaces a user's in-memory state with its snapshot on disk.
    LoadDatabaseTool
);

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddDocumentArgs {
    user_id: String,
    document: String,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    user_id: String,
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateArgs {
    user_id: String,
    doc_id: String,
    new_document: String,
    #[serde(default)]
    new_metadata: Option<Metadata>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DocArgs {
    user_id: String,
    doc_id: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UserArgs {
    user_id: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SaveDocumentsOnlyArgs {
    user_id: String,
    #[serde(default)]
    file_path: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LoadDocumentsOnlyArgs {
    file_path: String,
}

#[async_trait]
impl Tool for AddDocumentTool {
    fn name(&self) -> &str {
        "add_document"
    }

    fn description(&self) -> &str {
        "Add a new document to a user's memory. Creates the database for new users."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema("Unique identifier for the user (e.g. 'john_doe')"),
                "document": { "type": "string", "description": "Text content of the document" },
                "metadata": {
                    "type": "object",
                    "description": "Optional metadata (e.g. {\"source\": \"email\", \"category\": \"work\"})",
                    "additionalProperties": true
                }
            },
            "required": ["user_id", "document"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: AddDocumentArgs = parse_args(self.name(), input)?;
        let handle = self.factory.open(&args.user_id).await?;
        let doc_id = handle.lock().await.add(&args.document, args.metadata).await?;
        Ok(json!({
            "doc_id": doc_id,
            "user_id": args.user_id,
            "document_preview": preview(&args.document),
            "message": format!("Document added for user {}", args.user_id),
        }))
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &str {
        "search_documents"
    }

    fn description(&self) -> &str {
        "Search a user's documents by semantic similarity."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema("User whose documents to search"),
                "query": { "type": "string", "description": "Search query" },
                "top_k": {
                    "type": "integer",
                    "description": "Number of results to return",
                    "default": DEFAULT_TOP_K,
                    "minimum": 1,
                    "maximum": MAX_TOP_K
                }
            },
            "required": ["user_id", "query"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: SearchArgs = parse_args(self.name(), input)?;
        if !(1..=MAX_TOP_K).contains(&args.top_k) {
            return Err(MnemosError::Validation(format!(
                "top_k must be between 1 and {MAX_TOP_K}, got {}",
                args.top_k
            )));
        }

        let handle = self.factory.open(&args.user_id).await?;
        let results = handle.lock().await.search(&args.query, args.top_k).await?;
        Ok(json!({
            "query": args.query,
            "user_id": args.user_id,
            "num_results": results.len(),
            "results": results,
        }))
    }
}

#[async_trait]
impl Tool for UpdateDocumentTool {
    fn name(&self) -> &str {
        "update_document"
    }

    fn description(&self) -> &str {
        "Replace the text (and optionally the metadata) of an existing document."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema("Owner of the document"),
                "doc_id": { "type": "string", "description": "Id of the document (e.g. 'doc_0')" },
                "new_document": { "type": "string", "description": "New text content" },
                "new_metadata": {
                    "type": "object",
                    "description": "Replacement metadata; existing metadata is kept when omitted",
                    "additionalProperties": true
                }
            },
            "required": ["user_id", "doc_id", "new_document"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: UpdateArgs = parse_args(self.name(), input)?;
        let handle = self.factory.open(&args.user_id).await?;
        let updated = handle
            .lock()
            .await
            .update(&args.doc_id, &args.new_document, args.new_metadata)
            .await?;
        let message = if updated {
            format!("Document {} updated for user {}", args.doc_id, args.user_id)
        } else {
            format!("Document {} not found for user {}", args.doc_id, args.user_id)
        };
        Ok(json!({
            "doc_id": args.doc_id,
            "user_id": args.user_id,
            "updated": updated,
            "message": message,
        }))
    }
}

#[async_trait]
impl Tool for DeleteDocumentTool {
    fn name(&self) -> &str {
        "delete_document"
    }

    fn description(&self) -> &str {
        "Delete a document from a user's memory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema("Owner of the document"),
                "doc_id": { "type": "string", "description": "Id of the document (e.g. 'doc_0')" }
            },
            "required": ["user_id", "doc_id"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: DocArgs = parse_args(self.name(), input)?;
        let handle = self.factory.open(&args.user_id).await?;
        let deleted = handle.lock().await.delete(&args.doc_id).await?;
        let message = if deleted {
            format!("Document {} deleted for user {}", args.doc_id, args.user_id)
        } else {
            format!("Document {} not found for user {}", args.doc_id, args.user_id)
        };
        Ok(json!({
            "doc_id": args.doc_id,
            "user_id": args.user_id,
            "deleted": deleted,
            "message": message,
        }))
    }
}

#[async_trait]
impl Tool for DatabaseStatsTool {
    fn name(&self) -> &str {
        "get_database_stats"
    }

    fn description(&self) -> &str {
        "Get statistics about a user's database (document count, index variant, dimension)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_schema("User to report on") },
            "required": ["user_id"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: UserArgs = parse_args(self.name(), input)?;
        let handle = self.factory.open(&args.user_id).await?;
        let stats = handle.lock().await.stats();
        Ok(json!({ "user_id": args.user_id, "stats": stats }))
    }
}

#[async_trait]
impl Tool for ListUsersTool {
    fn name(&self) -> &str {
        "list_users"
    }

    fn description(&self) -> &str {
        "List every user that has a saved database."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({ "type": "object", "properties": {}, "additionalProperties": false })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let NoArgs {} = parse_args(self.name(), input)?;
        let users = self.factory.list_users().await?;
        Ok(json!({ "num_users": users.len(), "users": users }))
    }
}

#[async_trait]
impl Tool for DirectoryInfoTool {
    fn name(&self) -> &str {
        "get_user_directory_info"
    }

    fn description(&self) -> &str {
        "Describe a user's storage directory and the files in it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_schema("User whose directory to inspect") },
            "required": ["user_id"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: UserArgs = parse_args(self.name(), input)?;
        let info = self.factory.user_directory_info(&args.user_id).await?;
        Ok(json!({
            "user_id": args.user_id,
            "found": info.is_some(),
            "info": info,
        }))
    }
}

#[async_trait]
impl Tool for SaveDocumentsOnlyTool {
    fn name(&self) -> &str {
        "save_documents_only"
    }

    fn description(&self) -> &str {
        "Export a user's document ids and texts for inspection."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema("User whose documents to export"),
                "file_path": {
                    "type": "string",
                    "description": "Optional destination; defaults to the user's directory"
                }
            },
            "required": ["user_id"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: SaveDocumentsOnlyArgs = parse_args(self.name(), input)?;
        let handle = self.factory.open(&args.user_id).await?;
        let path = handle
            .lock()
            .await
            .export_documents_only(args.file_path.as_deref().map(Path::new))
            .await?;
        Ok(json!({
            "user_id": args.user_id,
            "file_path": path.display().to_string(),
            "saved": true,
        }))
    }
}

#[async_trait]
impl Tool for LoadDocumentsOnlyTool {
    fn name(&self) -> &str {
        "load_documents_only"
    }

    fn description(&self) -> &str {
        "Read a documents-only export file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path of the export to read" }
            },
            "required": ["file_path"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: LoadDocumentsOnlyArgs = parse_args(self.name(), input)?;
        let documents = self
            .factory
            .load_documents_only(Path::new(&args.file_path))
            .await?;
        Ok(match documents {
            Some(documents) => json!({
                "file_path": args.file_path,
                "loaded": true,
                "num_documents": documents.len(),
                "document_ids": documents.keys().collect::<Vec<_>>(),
                "documents": documents,
            }),
            None => json!({
                "file_path": args.file_path,
                "loaded": false,
                "documents": null,
            }),
        })
    }
}

#[async_trait]
impl Tool for SaveDatabaseTool {
    fn name(&self) -> &str {
        "save_database"
    }

    fn description(&self) -> &str {
        "Persist a user's database to disk."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_schema("User whose database to save") },
            "required": ["user_id"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: UserArgs = parse_args(self.name(), input)?;
        let handle = self.factory.open(&args.user_id).await?;
        let path = handle.lock().await.save().await?;
        Ok(json!({
            "user_id": args.user_id,
            "file_path": path.display().to_string(),
            "saved": true,
        }))
    }
}

#[async_trait]
impl Tool for LoadDatabaseTool {
    fn name(&self) -> &str {
        "load_database"
    }

    fn description(&self) -> &str {
        "Reload a user's database from disk, discarding unsaved state."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_schema("User whose database to load") },
            "required": ["user_id"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
        let args: UserArgs = parse_args(self.name(), input)?;
        if !self.factory.reload(&args.user_id).await? {
            return Ok(json!({ "user_id": args.user_id, "loaded": false }));
        }
        let handle = self.factory.open(&args.user_id).await?;
        let stats = handle.lock().await.stats();
        Ok(json!({ "user_id": args.user_id, "loaded": true, "stats": stats }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(150);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn every_schema_forbids_extra_properties() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(StoreFactory::new(
            dir.path(),
            mnemos_memory::StoreSettings::default(),
            Arc::new(mnemos_memory::HashEmbedder::new(16).unwrap()),
        ));
        let registry = store_registry(factory);
        assert_eq!(registry.len(), 11);
        for def in registry.tool_definitions() {
            let params = &def["function"]["parameters"];
            assert_eq!(params["additionalProperties"], false, "{}", def["function"]["name"]);
        }
    }
}
