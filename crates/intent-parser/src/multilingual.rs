//! Sentence embeddings from `paraphrase-multilingual-MiniLM-L12-v2` via fastembed.

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::info;

pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Load (downloading on first use) the multilingual paraphrase model.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        info!("Loading semantic command model (paraphrase-multilingual-MiniLM-L12-v2)");
        let mut options = InitOptions::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
            .with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }
        let model =
            TextEmbedding::try_new(options).map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;
        info!("Semantic command model loaded");
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl EmbeddingProvider for FastEmbedder {
    fn name(&self) -> &str {
        "paraphrase-multilingual-MiniLM-L12-v2"
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let docs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        self.model
            .lock()
            .embed(docs, None)
            .map_err(|e| EmbeddingError::Model(e.to_string()))
    }
}
