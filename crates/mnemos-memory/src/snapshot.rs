// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-state snapshots of one user's document store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<user_id>/store_<user_id>.json           full snapshot
//! <root>/<user_id>/documents_only_<user_id>.json  doc_id -> text export
//! ```
//!
//! Snapshots are written whole to a temporary sibling file and renamed into
//! place. There is no locking or versioning across processes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use mnemos_core::error::MnemosError;
use mnemos_core::traits::EmbeddingAdapter;
use mnemos_core::types::IndexVariant;
use mnemos_index::{Index, VectorIndex};
use serde::{Deserialize, Serialize};

use crate::store::DocumentStore;
use crate::types::Document;

/// Longest accepted user id, in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// Rejects ids that are unsafe as a single directory name.
pub fn validate_user_id(user_id: &str) -> Result<(), MnemosError> {
    let valid_chars = user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if user_id.is_empty()
        || user_id.len() > MAX_USER_ID_LEN
        || user_id.starts_with('.')
        || !valid_chars
    {
        return Err(MnemosError::Validation(format!(
            "invalid user id `{user_id}`: use 1-{MAX_USER_ID_LEN} characters from \
             [A-Za-z0-9_.-], not starting with '.'"
        )));
    }
    Ok(())
}

pub fn user_dir(root: &Path, user_id: &str) -> PathBuf {
    root.join(user_id)
}

pub fn snapshot_path(root: &Path, user_id: &str) -> PathBuf {
    user_dir(root, user_id).join(format!("store_{user_id}.json"))
}

pub fn documents_only_path(root: &Path, user_id: &str) -> PathBuf {
    user_dir(root, user_id).join(format!("documents_only_{user_id}.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub user_id: String,
    pub variant: IndexVariant,
    pub dimension: usize,
    /// Next `doc_{n}` number. Survives deletes so ids are never reused.
    pub counter: u64,
    /// Live documents in index row order.
    pub documents: Vec<Document>,
    /// Base64 of the serialized index.
    pub index: String,
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn capture(user_id: &str, store: &DocumentStore) -> Result<Self, MnemosError> {
        Ok(Self {
            user_id: user_id.to_string(),
            variant: store.variant(),
            dimension: store.dimension(),
            counter: store.counter(),
            documents: store.documents().to_vec(),
            index: STANDARD.encode(store.index().to_bytes()?),
            saved_at: Utc::now(),
        })
    }

    pub fn restore(self, embedder: Arc<dyn EmbeddingAdapter>) -> Result<DocumentStore, MnemosError> {
        let bytes = STANDARD.decode(&self.index).map_err(MnemosError::storage)?;
        let index = Index::from_bytes(&bytes)?;
        if index.variant() != self.variant || index.dimension() != self.dimension {
            return Err(MnemosError::storage(invalid_data(format!(
                "snapshot for `{}` declares {}/{} but holds a {}/{} index",
                self.user_id,
                self.variant,
                self.dimension,
                index.variant(),
                index.dimension()
            ))));
        }
        DocumentStore::from_parts(self.documents, self.counter, index, embedder)
    }
}

fn invalid_data(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}

/// Writes `bytes` to `path` through a temporary file and rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MnemosError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

pub(crate) async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), MnemosError> {
    let bytes = serde_json::to_vec(snapshot).map_err(MnemosError::storage)?;
    write_atomic(path, &bytes).await
}

/// Reads a snapshot. A missing file is `None`; an unreadable or malformed one is an error.
pub(crate) async fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, MnemosError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(MnemosError::storage),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes the `doc_id -> text` export.
pub(crate) async fn write_documents_only(
    path: &Path,
    documents: &[Document],
) -> Result<(), MnemosError> {
    let export: BTreeMap<&str, &str> = documents
        .iter()
        .map(|d| (d.doc_id.as_str(), d.text.as_str()))
        .collect();
    let bytes = serde_json::to_vec_pretty(&export).map_err(MnemosError::storage)?;
    write_atomic(path, &bytes).await
}

/// Reads a `doc_id -> text` export. A missing file is `None`.
pub async fn read_documents_only(
    path: &Path,
) -> Result<Option<BTreeMap<String, String>>, MnemosError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(MnemosError::storage),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
