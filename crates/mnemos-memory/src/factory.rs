// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hands out one database handle per user.
//!
//! Each user's state lives behind its own `Arc<Mutex<UserDatabase>>`; there
//! is no process-wide "current user". Repeated opens of the same user return
//! the same handle, so calls for one user are serialized while different
//! users never share mutable state.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mnemos_config::MnemosConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::EmbeddingAdapter;
use mnemos_core::types::IndexVariant;
use mnemos_index::IndexParams;
use tokio::sync::Mutex;
use tracing::debug;

use crate::database::UserDatabase;
use crate::snapshot;
use crate::types::{DirectoryInfo, FileInfo};

pub type DatabaseHandle = Arc<Mutex<UserDatabase>>;

/// Defaults for users without a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSettings {
    pub variant: IndexVariant,
    pub params: IndexParams,
}

impl StoreSettings {
    pub fn from_config(config: &MnemosConfig) -> Self {
        let index = &config.index;
        Self {
            variant: config.store.index,
            params: IndexParams {
                training_size: index.training_size,
                clusters: index.clusters,
                probes: index.probes,
                neighbors: index.neighbors,
                ef_construction: index.ef_construction,
                ef_search: index.ef_search,
            },
        }
    }
}

pub struct StoreFactory {
    root: PathBuf,
    settings: StoreSettings,
    embedder: Arc<dyn EmbeddingAdapter>,
    handles: Mutex<HashMap<String, DatabaseHandle>>,
}

impl StoreFactory {
    pub fn new(
        root: impl Into<PathBuf>,
        settings: StoreSettings,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Self {
        Self {
            root: root.into(),
            settings,
            embedder,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn embedder(&self) -> Arc<dyn EmbeddingAdapter> {
        Arc::clone(&self.embedder)
    }

    /// Returns the handle for `user_id`, loading or creating its database on first touch.
    pub async fn open(&self, user_id: &str) -> Result<DatabaseHandle, MnemosError> {
        snapshot::validate_user_id(user_id)?;

        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(user_id) {
            return Ok(Arc::clone(handle));
        }

        let db = UserDatabase::open(&self.root, user_id, &self.settings, self.embedder()).await?;
        let handle = Arc::new(Mutex::new(db));
        handles.insert(user_id.to_string(), Arc::clone(&handle));
        debug!(user_id, open_users = handles.len(), "user handle opened");
        Ok(handle)
    }

    /// Reloads `user_id` from disk. Returns `false` when it has no snapshot.
    pub async fn reload(&self, user_id: &str) -> Result<bool, MnemosError> {
        let handle = self.open(user_id).await?;
        let mut db = handle.lock().await;
        db.reload(self.embedder()).await
    }

    /// Ids of every user whose directory holds a snapshot, sorted.
    pub async fn list_users(&self) -> Result<Vec<String>, MnemosError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut users = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if snapshot::validate_user_id(&name).is_err() {
                continue;
            }
            if tokio::fs::try_exists(snapshot::snapshot_path(&self.root, &name)).await? {
                users.push(name);
            }
        }
        users.sort();
        Ok(users)
    }

    /// Lists the files in a user's directory, or `None` if it does not exist.
    pub async fn user_directory_info(
        &self,
        user_id: &str,
    ) -> Result<Option<DirectoryInfo>, MnemosError> {
        snapshot::validate_user_id(user_id)?;
        let dir = snapshot::user_dir(&self.root, user_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let size_bytes = meta.len();
            files.push(FileInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes,
                size_mb: (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Some(DirectoryInfo {
            user_id: user_id.to_string(),
            directory: dir.display().to_string(),
            files,
        }))
    }

    /// Reads a `doc_id -> text` export from `path`.
    pub async fn load_documents_only(
        &self,
        path: &Path,
    ) -> Result<Option<BTreeMap<String, String>>, MnemosError> {
        snapshot::read_documents_only(path).await
    }
}
