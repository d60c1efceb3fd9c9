// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store domain types.

use mnemos_core::IndexVariant;
use serde::{Deserialize, Serialize};

/// Free-form per-document metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// `doc_{n}` from the per-database counter. Never reused.
    pub doc_id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A search hit resolved back to its document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: String,
    pub text: String,
    /// Inner product of unit vectors, higher is closer.
    pub score: f32,
    pub metadata: Metadata,
}

/// Summary of one user's store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub variant: IndexVariant,
    pub dimension: usize,
    /// `false` only for a clustered index below its training size.
    pub trained: bool,
    pub document_ids: Vec<String>,
}

/// A file inside a user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size_bytes: u64,
    pub size_mb: f64,
}

/// Contents of one user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub user_id: String,
    pub directory: String,
    /// Sorted by name.
    pub files: Vec<FileInfo>,
}
