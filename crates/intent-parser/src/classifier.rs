//! Nearest-paraphrase intent classification

use crate::embedding::{embed_normalized, EmbeddingError, EmbeddingProvider};
use crate::{Catalog, Command};
use std::sync::Arc;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Default minimum cosine similarity for accepting a command.
pub const DEFAULT_THRESHOLD: f32 = 0.55;

/// Outcome of classifying one utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Best command if it cleared the threshold.
    pub command: Option<Command>,
    /// Best per-command similarity, reported even on a miss.
    pub score: f32,
}

impl Classification {
    pub fn is_match(&self) -> bool {
        self.command.is_some()
    }
}

/// NFC-compose, lowercase and trim. No transliteration or translation.
pub fn normalize_utterance(text: &str) -> String {
    text.trim().nfc().collect::<String>().to_lowercase()
}

/// Scores an utterance against every catalog command.
///
/// A command's score is the maximum similarity over its example phrases. The
/// highest-scoring command wins; on equal scores the command that comes first
/// in the catalog is kept.
pub struct IntentClassifier {
    catalog: Arc<Catalog>,
    embedder: Arc<dyn EmbeddingProvider>,
    threshold: f32,
}

impl IntentClassifier {
    pub fn new(catalog: Arc<Catalog>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            catalog,
            embedder,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn classify(&self, utterance: &str) -> Result<Classification, EmbeddingError> {
        let text = normalize_utterance(utterance);
        let query = embed_normalized(self.embedder.as_ref(), &text)?;

        let mut best: Option<Command> = None;
        let mut best_score = 0.0_f32;
        for entry in self.catalog.entries() {
            let mut cmd_score = f32::NEG_INFINITY;
            for example in &entry.embeddings {
                cmd_score = cmd_score.max(query.cosine(example)?);
            }
            debug!(command = %entry.command, score = cmd_score, "command similarity");
            if cmd_score > best_score {
                best_score = cmd_score;
                best = Some(entry.command);
            }
        }

        let command = best.filter(|_| best_score >= self.threshold);
        Ok(Classification {
            command,
            score: best_score,
        })
    }
}
