//! Intent Parser for Voice Commands
//!
//! Maps free-form spoken utterances onto the robot's fixed set of motion
//! commands by comparing sentence embeddings against example phrasings, then
//! sends the matching action code over the actuator link.
//!
//! The pieces are wired explicitly: build a [`Catalog`] once at startup with
//! an [`EmbeddingProvider`], hand it to an [`IntentClassifier`], and give the
//! classifier plus an actuator channel to a [`CommandDispatcher`].

mod catalog;
mod classifier;
mod commands;
mod dispatcher;
mod embedding;
mod metrics;
mod steps;

pub use catalog::{
    load_catalog_file, Catalog, CatalogEntry, CatalogError, CatalogSpec, CommandOverride,
    CommandSpec,
};
pub use classifier::{normalize_utterance, Classification, IntentClassifier, DEFAULT_THRESHOLD};
pub use commands::Command;
pub use dispatcher::{
    CommandDispatcher, CommandExecutor, DispatchError, Recognition, DEFAULT_MAX_STEPS,
};
pub use embedding::{
    embed_batch_normalized, embed_normalized, Embedding, EmbeddingError, EmbeddingProvider,
};
pub use metrics::DispatchMetrics;
pub use steps::extract_steps;

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::HashingEmbedder;

#[cfg(feature = "fastembed")]
mod multilingual;
#[cfg(feature = "fastembed")]
pub use multilingual::FastEmbedder;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for command recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Minimum similarity for accepting a command
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    /// Cap on repeats parsed from "N bước"
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Optional YAML file overriding action codes or example phrases
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_max_steps() -> u32 {
    DEFAULT_MAX_STEPS
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_THRESHOLD,
            max_steps: DEFAULT_MAX_STEPS,
            catalog_file: None,
        }
    }
}

impl IntentConfig {
    /// Threshold must be a finite similarity in [0, 1].
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".to_string());
        }
        Ok(())
    }

    /// Catalog spec from `catalog_file`, or the built-in defaults.
    pub fn catalog_spec(&self) -> anyhow::Result<CatalogSpec> {
        match &self.catalog_file {
            Some(path) => load_catalog_file(path),
            None => Ok(CatalogSpec::default()),
        }
    }
}

/// Build the catalog and classifier described by `config`.
///
/// Any failure here is a startup configuration error.
pub fn build_classifier(
    config: &IntentConfig,
    embedder: std::sync::Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<IntentClassifier> {
    config.validate().map_err(anyhow::Error::msg)?;
    let spec = config.catalog_spec()?;
    let catalog = Catalog::build(spec, embedder.as_ref())?;
    Ok(IntentClassifier::new(std::sync::Arc::new(catalog), embedder)
        .with_threshold(config.confidence_threshold))
}
