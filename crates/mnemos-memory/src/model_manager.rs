// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the ONNX embedding model.

use std::path::{Path, PathBuf};

use mnemos_core::error::MnemosError;
use tokio::sync::OnceCell;
use tracing::info;

const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Resolves model file paths under `<models_dir>/<model_name>` and fetches
/// missing files from HuggingFace.
pub struct ModelManager {
    models_dir: PathBuf,
    model_name: String,
    /// Serializes concurrent first-run downloads.
    ready: OnceCell<PathBuf>,
}

impl ModelManager {
    pub fn new(models_dir: PathBuf, model_name: &str) -> Self {
        Self {
            models_dir,
            model_name: model_name.to_string(),
            ready: OnceCell::new(),
        }
    }

    pub fn model_dir(&self) -> PathBuf {
        self.models_dir.join(&self.model_name)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Returns the model path, downloading any missing file first.
    pub async fn ensure_model(&self) -> Result<PathBuf, MnemosError> {
        self.ready
            .get_or_try_init(|| async {
                if self.is_model_available() {
                    return Ok(self.model_path());
                }

                let model_dir = self.model_dir();
                info!(dir = %model_dir.display(), "embedding model not found, downloading");
                tokio::fs::create_dir_all(&model_dir).await?;

                for (filename, url) in [("model.onnx", MODEL_URL), ("tokenizer.json", TOKENIZER_URL)] {
                    let dest = model_dir.join(filename);
                    if dest.exists() {
                        continue;
                    }
                    match download_file(url, &dest).await {
                        Ok(size) => info!(file = filename, bytes = size, "downloaded model file"),
                        Err(e) => {
                            let _ = tokio::fs::remove_file(&dest).await;
                            return Err(e);
                        }
                    }
                }

                Ok(self.model_path())
            })
            .await
            .cloned()
    }
}

async fn download_file(url: &str, dest: &Path) -> Result<usize, MnemosError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| MnemosError::Embedding(format!("failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(MnemosError::Embedding(format!(
            "download failed with status {}: {url}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MnemosError::Embedding(format!("failed to read body from {url}: {e}")))?;

    tokio::fs::write(dest, &bytes).await?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_model_name() {
        let mgr = ModelManager::new(PathBuf::from("/data/models"), "all-MiniLM-L6-v2");
        assert_eq!(
            mgr.model_path(),
            PathBuf::from("/data/models/all-MiniLM-L6-v2/model.onnx")
        );
        assert_eq!(
            mgr.tokenizer_path(),
            PathBuf::from("/data/models/all-MiniLM-L6-v2/tokenizer.json")
        );
    }

    #[test]
    fn model_not_available_when_missing() {
        let mgr = ModelManager::new(PathBuf::from("/nonexistent/path"), "m");
        assert!(!mgr.is_model_available());
    }
}
