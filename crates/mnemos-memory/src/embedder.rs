// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feature-hashing embedding adapter.
//!
//! Lowercased alphanumeric tokens are hashed with SHA-256 into signed
//! buckets and the bucket vector is L2-normalized. Texts sharing words score
//! high against each other; unrelated texts score near zero. Needs no model
//! files and is fully deterministic, which makes it the default for tests
//! and offline use.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_config::model::{EmbeddingConfig, EmbeddingProvider};
use mnemos_core::error::MnemosError;
use mnemos_core::traits::{EmbeddingAdapter, PluginAdapter};
use mnemos_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use mnemos_index::l2_normalize;
use sha2::{Digest, Sha256};

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, MnemosError> {
        if dimension == 0 {
            return Err(MnemosError::Validation(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Embed a single text into a unit-norm vector.
    ///
    /// Alphanumeric tokens are hashed into signed buckets. Text whose tokens
    /// leave every bucket at zero (punctuation, emoji, blank text, or tokens
    /// that cancel) is hashed whole instead, so no text maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            self.hash_into(&mut buckets, token);
        }
        if buckets.iter().all(|b| *b == 0.0) {
            self.hash_into(&mut buckets, lowered.trim());
        }
        l2_normalize(&buckets)
    }

    fn hash_into(&self, buckets: &mut [f32], token: &str) {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(head) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        buckets[bucket] += sign;
    }
}

#[async_trait]
impl PluginAdapter for HashEmbedder {
    fn name(&self) -> &str {
        "hash-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemosError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemosError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemosError> {
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.embed_text(t)).collect(),
            dimensions: self.dimension,
        })
    }
}

/// Builds the embedding adapter selected by configuration.
///
/// The ONNX provider downloads its model on first use and is only available
/// when the crate is built with the `onnx` feature.
pub async fn build_embedder(
    config: &EmbeddingConfig,
    dimension: usize,
) -> Result<Arc<dyn EmbeddingAdapter>, MnemosError> {
    match config.provider {
        EmbeddingProvider::Hash => Ok(Arc::new(HashEmbedder::new(dimension)?)),
        #[cfg(feature = "onnx")]
        EmbeddingProvider::Onnx => {
            let manager = crate::model_manager::ModelManager::new(
                config.resolved_model_dir(),
                &config.model_name,
            );
            let model_path = manager.ensure_model().await?;
            Ok(Arc::new(crate::onnx::OnnxEmbedder::new(&model_path)?))
        }
        #[cfg(not(feature = "onnx"))]
        EmbeddingProvider::Onnx => Err(MnemosError::Config(
            "embedding.provider = \"onnx\" requires building with the `onnx` feature".to_string(),
        )),
    }
}

/// Embeds `texts` and checks the adapter honored its contract.
pub(crate) async fn embed_checked(
    embedder: &dyn EmbeddingAdapter,
    texts: Vec<String>,
    dimension: usize,
) -> Result<Vec<Vec<f32>>, MnemosError> {
    let expected = texts.len();
    if expected == 0 {
        return Ok(Vec::new());
    }
    let output = embedder.embed(EmbeddingInput { texts }).await?;
    if output.embeddings.len() != expected {
        return Err(MnemosError::Embedding(format!(
            "{} returned {} embeddings for {expected} texts",
            embedder.name(),
            output.embeddings.len()
        )));
    }
    if let Some(bad) = output.embeddings.iter().find(|v| v.len() != dimension) {
        return Err(MnemosError::Embedding(format!(
            "{} returned a {}-dimensional vector, store expects {dimension}",
            embedder.name(),
            bad.len()
        )));
    }
    Ok(output.embeddings)
}
