// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document CRUD over a pluggable vector index.
//!
//! `documents` is the authoritative ordered list. Whenever the index is
//! indexed it holds exactly one vector per document and row `i` is the
//! embedding of `documents[i]`. Indexes are append-only, so update and delete
//! rebuild the index from the surviving documents (rebuild-by-exclusion).

use std::sync::Arc;

use mnemos_core::error::MnemosError;
use mnemos_core::traits::EmbeddingAdapter;
use mnemos_core::types::IndexVariant;
use mnemos_index::{Index, IndexParams, VectorIndex, dot, rank_top_k};
use tracing::debug;

use crate::embedder::embed_checked;
use crate::types::{Document, Metadata, SearchResult, StoreStats};

pub struct DocumentStore {
    documents: Vec<Document>,
    counter: u64,
    index: Index,
    embedder: Arc<dyn EmbeddingAdapter>,
}

impl DocumentStore {
    /// Creates an empty store. The embedder's dimension fixes the index dimension.
    pub fn new(
        variant: IndexVariant,
        params: &IndexParams,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Self {
        let index = Index::new(variant, embedder.dimensions(), params);
        Self {
            documents: Vec::new(),
            counter: 0,
            index,
            embedder,
        }
    }

    /// Reassembles a store from persisted parts.
    pub(crate) fn from_parts(
        documents: Vec<Document>,
        counter: u64,
        index: Index,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, MnemosError> {
        if index.dimension() != embedder.dimensions() {
            return Err(MnemosError::Validation(format!(
                "stored index has dimension {}, embedder {} produces {}",
                index.dimension(),
                embedder.name(),
                embedder.dimensions()
            )));
        }
        if index.is_indexed() && index.len() != documents.len() {
            return Err(MnemosError::storage(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "stored index holds {} vectors for {} documents",
                    index.len(),
                    documents.len()
                ),
            )));
        }
        Ok(Self {
            documents,
            counter,
            index,
            embedder,
        })
    }

    pub fn variant(&self) -> IndexVariant {
        self.index.variant()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, doc_id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.doc_id == doc_id)
    }

    fn position(&self, doc_id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.doc_id == doc_id)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MnemosError> {
        let mut vectors =
            embed_checked(self.embedder.as_ref(), vec![text.to_string()], self.dimension()).await?;
        vectors
            .pop()
            .ok_or_else(|| MnemosError::Embedding("embedder returned no vector".to_string()))
    }

    /// Re-embeds every current document in list order, skipping `exclude`.
    async fn embed_documents(&self, exclude: Option<usize>) -> Result<Vec<Vec<f32>>, MnemosError> {
        let texts = self
            .documents
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != exclude)
            .map(|(_, d)| d.text.clone())
            .collect();
        embed_checked(self.embedder.as_ref(), texts, self.dimension()).await
    }

    /// Indexes `vector` into `index` as the embedding of the last of `len`
    /// documents.
    ///
    /// `preceding` holds the embeddings of every earlier document. An
    /// unindexed (untrained clustered) index skips the vector until the corpus
    /// first reaches its training size, then trains on the whole corpus.
    fn index_appended(
        index: &mut Index,
        len: usize,
        vector: Vec<f32>,
        preceding: impl FnOnce() -> Option<Vec<Vec<f32>>>,
    ) -> Result<(), MnemosError> {
        if index.is_indexed() {
            index.add(&[vector])?;
        } else if let Some(threshold) = index.training_size()
            && len >= threshold
            && let Some(mut corpus) = preceding()
        {
            corpus.push(vector);
            index.rebuild_from(&corpus)?;
            debug!(
                documents = len,
                trained = index.is_indexed(),
                "index trained on full corpus"
            );
        }
        Ok(())
    }

    /// Whether appending one more document would trigger training.
    fn training_due(&self, len_after: usize) -> bool {
        !self.index.is_indexed()
            && self
                .index
                .training_size()
                .is_some_and(|threshold| len_after >= threshold)
    }

    /// Stores `text` and returns its new `doc_id`.
    pub async fn add(
        &mut self,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<String, MnemosError> {
        let vector = self.embed_one(text).await?;
        let preceding = if self.training_due(self.documents.len() + 1) {
            Some(self.embed_documents(None).await?)
        } else {
            None
        };

        let doc_id = format!("doc_{}", self.counter);
        self.counter += 1;
        self.documents.push(Document {
            doc_id: doc_id.clone(),
            text: text.to_string(),
            metadata: metadata.unwrap_or_default(),
        });

        if let Err(e) = Self::index_appended(&mut self.index, self.documents.len(), vector, || preceding) {
            self.documents.pop();
            return Err(e);
        }

        self.debug_check_alignment();
        Ok(doc_id)
    }

    /// Replaces the text of `doc_id`, and its metadata when given.
    ///
    /// Returns `false` if the document does not exist. The updated document
    /// keeps its id and moves to the end of the list so that its new vector,
    /// appended last, stays aligned with it. The replacement index is built
    /// before the list changes; on failure the store is left as it was.
    pub async fn update(
        &mut self,
        doc_id: &str,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<bool, MnemosError> {
        let Some(position) = self.position(doc_id) else {
            return Ok(false);
        };
        let vector = self.embed_one(text).await?;
        let survivors = self.embed_documents(Some(position)).await?;

        let mut index = self.index.emptied();
        index.rebuild_from(&survivors)?;
        Self::index_appended(&mut index, self.documents.len(), vector, || Some(survivors))?;

        let mut document = self.documents.remove(position);
        document.text = text.to_string();
        if let Some(metadata) = metadata {
            document.metadata = metadata;
        }
        self.documents.push(document);
        self.index = index;
        debug!(doc_id, documents = self.documents.len(), "index rebuilt for update");

        self.debug_check_alignment();
        Ok(true)
    }

    /// Removes `doc_id`. Returns `false` if the document does not exist.
    pub async fn delete(&mut self, doc_id: &str) -> Result<bool, MnemosError> {
        let Some(position) = self.position(doc_id) else {
            return Ok(false);
        };
        let survivors = self.embed_documents(Some(position)).await?;

        let mut index = self.index.emptied();
        index.rebuild_from(&survivors)?;

        self.documents.remove(position);
        self.index = index;
        debug!(doc_id, documents = self.documents.len(), "index rebuilt for delete");

        self.debug_check_alignment();
        Ok(true)
    }

    /// Returns up to `top_k` documents by descending similarity to `query`.
    ///
    /// While the index is unindexed, every document is embedded on the fly
    /// and ranked exhaustively with the same ordering as the exact index.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, MnemosError> {
        if self.documents.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embed_one(query).await?;
        let k = top_k.min(self.documents.len());

        let hits = if self.index.is_indexed() {
            self.index.search(&query, k)?
        } else {
            let vectors = self.embed_documents(None).await?;
            rank_top_k(
                vectors.iter().enumerate().map(|(row, v)| (row, dot(v, &query))),
                k,
            )
        };

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.documents.get(hit.row).map(|doc| SearchResult {
                    doc_id: doc.doc_id.clone(),
                    text: doc.text.clone(),
                    score: hit.score,
                    metadata: doc.metadata.clone(),
                })
            })
            .collect())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            document_count: self.documents.len(),
            variant: self.variant(),
            dimension: self.dimension(),
            trained: self.index.is_trained(),
            document_ids: self.documents.iter().map(|d| d.doc_id.clone()).collect(),
        }
    }

    fn debug_check_alignment(&self) {
        debug_assert!(
            !self.index.is_indexed() || self.index.len() == self.documents.len(),
            "index rows ({}) out of step with documents ({})",
            self.index.len(),
            self.documents.len()
        );
    }
}
