// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`DocumentStore`] bound to one user and its on-disk snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mnemos_core::error::MnemosError;
use mnemos_core::traits::EmbeddingAdapter;
use tracing::{debug, info};

use crate::factory::StoreSettings;
use crate::snapshot::{self, Snapshot};
use crate::store::DocumentStore;
use crate::types::{Metadata, SearchResult, StoreStats};

/// One user's documents. Every successful mutation rewrites the full snapshot.
pub struct UserDatabase {
    user_id: String,
    root: PathBuf,
    store: DocumentStore,
}

impl UserDatabase {
    /// Loads the user's snapshot if one exists, otherwise starts an empty
    /// store with `settings`. A loaded snapshot keeps its own variant.
    pub async fn open(
        root: &Path,
        user_id: &str,
        settings: &StoreSettings,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, MnemosError> {
        snapshot::validate_user_id(user_id)?;
        let path = snapshot::snapshot_path(root, user_id);

        let store = match snapshot::read_snapshot(&path).await? {
            Some(snap) => {
                let store = snap.restore(embedder)?;
                info!(
                    user_id,
                    documents = store.len(),
                    variant = %store.variant(),
                    "loaded user database"
                );
                store
            }
            None => {
                info!(user_id, variant = %settings.variant, "created user database");
                DocumentStore::new(settings.variant, &settings.params, embedder)
            }
        };

        Ok(Self {
            user_id: user_id.to_string(),
            root: root.to_path_buf(),
            store,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn snapshot_path(&self) -> PathBuf {
        snapshot::snapshot_path(&self.root, &self.user_id)
    }

    pub async fn add(
        &mut self,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<String, MnemosError> {
        let doc_id = self.store.add(text, metadata).await?;
        self.save().await?;
        debug!(user_id = %self.user_id, doc_id = %doc_id, "document added");
        Ok(doc_id)
    }

    pub async fn update(
        &mut self,
        doc_id: &str,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<bool, MnemosError> {
        let updated = self.store.update(doc_id, text, metadata).await?;
        if updated {
            self.save().await?;
            debug!(user_id = %self.user_id, doc_id, "document updated");
        }
        Ok(updated)
    }

    pub async fn delete(&mut self, doc_id: &str) -> Result<bool, MnemosError> {
        let deleted = self.store.delete(doc_id).await?;
        if deleted {
            self.save().await?;
            debug!(user_id = %self.user_id, doc_id, "document deleted");
        }
        Ok(deleted)
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, MnemosError> {
        self.store.search(query, top_k).await
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Writes the full snapshot and returns its path.
    pub async fn save(&self) -> Result<PathBuf, MnemosError> {
        let path = self.snapshot_path();
        let snap = Snapshot::capture(&self.user_id, &self.store)?;
        snapshot::write_snapshot(&path, &snap).await?;
        Ok(path)
    }

    /// Replaces in-memory state with the snapshot on disk.
    ///
    /// Returns `false`, leaving state untouched, when no snapshot exists.
    pub async fn reload(&mut self, embedder: Arc<dyn EmbeddingAdapter>) -> Result<bool, MnemosError> {
        match snapshot::read_snapshot(&self.snapshot_path()).await? {
            Some(snap) => {
                self.store = snap.restore(embedder)?;
                info!(user_id = %self.user_id, documents = self.store.len(), "reloaded user database");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes the `doc_id -> text` export to `path`, or to the default
    /// location in the user directory, and returns where it was written.
    pub async fn export_documents_only(&self, path: Option<&Path>) -> Result<PathBuf, MnemosError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => snapshot::documents_only_path(&self.root, &self.user_id),
        };
        snapshot::write_documents_only(&path, self.store.documents()).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use tracing_test::traced_test;

    fn embedder() -> Arc<dyn EmbeddingAdapter> {
        Arc::new(HashEmbedder::new(64).unwrap())
    }

    #[tokio::test]
    #[traced_test]
    async fn open_logs_whether_the_user_was_created_or_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings::default();

        let mut db = UserDatabase::open(dir.path(), "ana", &settings, embedder())
            .await
            .unwrap();
        assert!(logs_contain("created user database"));
        db.add("first note", None).await.unwrap();

        UserDatabase::open(dir.path(), "ana", &settings, embedder())
            .await
            .unwrap();
        assert!(logs_contain("loaded user database"));
    }

    #[tokio::test]
    async fn missed_update_and_delete_leave_no_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = UserDatabase::open(dir.path(), "bo", &StoreSettings::default(), embedder())
            .await
            .unwrap();

        assert!(!db.update("doc_9", "x", None).await.unwrap());
        assert!(!db.delete("doc_9").await.unwrap());
        assert!(!db.snapshot_path().exists());
    }
}
