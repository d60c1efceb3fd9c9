// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding adapter for local all-MiniLM-L6-v2 inference.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use mnemos_core::error::MnemosError;
use mnemos_core::traits::{EmbeddingAdapter, PluginAdapter};
use mnemos_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use mnemos_index::l2_normalize;

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Runs the quantized model on CPU with a single intra-op thread.
pub struct OnnxEmbedder {
    /// Session is not Sync; every inference takes the lock.
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

fn onnx_err<E: std::fmt::Display>(context: &str) -> impl Fn(E) -> MnemosError + '_ {
    move |e| MnemosError::Embedding(format!("{context}: {e}"))
}

impl OnnxEmbedder {
    /// Loads `model.onnx` from `model_path` and `tokenizer.json` from the same directory.
    pub fn new(model_path: &Path) -> Result<Self, MnemosError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| MnemosError::Embedding("invalid model path".to_string()))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MnemosError::Embedding(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let session = Session::builder()
            .map_err(onnx_err("failed to create session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_err("failed to set optimization level"))?
            .with_intra_threads(1)
            .map_err(onnx_err("failed to set thread count"))?
            .commit_from_file(model_path)
            .map_err(onnx_err("failed to load model"))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, MnemosError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MnemosError::Embedding(format!("tokenization failed: {e}")))?;

        let to_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();
        let input_ids = to_i64(encoding.get_ids());
        let attention_mask = to_i64(encoding.get_attention_mask());
        let token_type_ids = to_i64(encoding.get_type_ids());
        let seq_len = input_ids.len();

        let shape_err = |e: ndarray::ShapeError| {
            MnemosError::Embedding(format!("failed to shape input tensor: {e}"))
        };
        let input_ids = Array2::from_shape_vec((1, seq_len), input_ids).map_err(shape_err)?;
        let mask = Array2::from_shape_vec((1, seq_len), attention_mask.clone()).map_err(shape_err)?;
        let type_ids = Array2::from_shape_vec((1, seq_len), token_type_ids).map_err(shape_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MnemosError::Embedding(format!("ONNX session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => TensorRef::from_array_view(&input_ids).map_err(onnx_err("input_ids"))?,
                "attention_mask" => TensorRef::from_array_view(&mask).map_err(onnx_err("attention_mask"))?,
                "token_type_ids" => TensorRef::from_array_view(&type_ids).map_err(onnx_err("token_type_ids"))?
            ])
            .map_err(onnx_err("inference failed"))?;

        // Output shape is [1, seq_len, hidden].
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err("failed to extract output tensor"))?;

        let hidden_size = shape[shape.len() - 1] as usize;
        let pooled = mean_pool_with_attention(data, &attention_mask, seq_len, hidden_size);
        Ok(l2_normalize(&pooled))
    }
}

/// Attention-masked mean pooling over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (i, &mask) in attention_mask.iter().enumerate().take(seq_len) {
        if mask > 0 {
            let token = &embeddings[i * hidden_size..(i + 1) * hidden_size];
            for (s, x) in sum.iter_mut().zip(token) {
                *s += x;
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut sum {
            *val /= count;
        }
    }

    sum
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemosError> {
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("session lock poisoned: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), MnemosError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OnnxEmbedder {
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemosError> {
        let embeddings = input
            .texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_skips_padding() {
        let embeddings = vec![
            0.0, 0.0, 0.0, // padding
            1.0, 2.0, 3.0,
        ];
        let result = mean_pool_with_attention(&embeddings, &[0, 1], 2, 3);
        assert_eq!(result, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn mean_pool_averages_real_tokens() {
        let embeddings = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let result = mean_pool_with_attention(&embeddings, &[1, 1, 1], 3, 2);
        assert!((result[0] - 3.0).abs() < f32::EPSILON);
        assert!((result[1] - 4.0).abs() < f32::EPSILON);
    }
}
