//! Command catalog: action codes, example phrases and their cached embeddings

use crate::classifier::normalize_utterance;
use crate::embedding::{embed_batch_normalized, Embedding, EmbeddingError, EmbeddingProvider};
use crate::Command;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("command catalog is empty")]
    Empty,
    #[error("command '{0}' has no example phrases")]
    NoPhrases(Command),
    #[error("command '{0}' is listed more than once")]
    DuplicateCommand(Command),
    #[error("action code 0x{code:02X} is shared by '{first}' and '{second}'")]
    DuplicateCode {
        code: u8,
        first: Command,
        second: Command,
    },
    #[error("embedding example phrases failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Load-time definition of one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: Command,
    pub code: u8,
    pub phrases: Vec<String>,
}

/// Per-command override as written in a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandOverride {
    #[serde(default)]
    pub code: Option<u8>,
    #[serde(default)]
    pub phrases: Option<Vec<String>>,
}

/// The catalog before embeddings are computed.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSpec {
    entries: Vec<CommandSpec>,
}

impl Default for CatalogSpec {
    fn default() -> Self {
        let entries = Command::ALL
            .into_iter()
            .map(|command| CommandSpec {
                command,
                code: command.default_code(),
                phrases: command
                    .default_phrases()
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
            })
            .collect();
        Self { entries }
    }
}

impl CatalogSpec {
    /// Build from explicit entries. Order is preserved and decides ties.
    pub fn from_entries(entries: Vec<CommandSpec>) -> Self {
        Self { entries }
    }

    /// Defaults with file overrides applied.
    pub fn with_overrides(overrides: &BTreeMap<Command, CommandOverride>) -> Self {
        let mut spec = Self::default();
        for entry in &mut spec.entries {
            if let Some(o) = overrides.get(&entry.command) {
                if let Some(code) = o.code {
                    entry.code = code;
                }
                if let Some(phrases) = &o.phrases {
                    entry.phrases = phrases.clone();
                }
            }
        }
        spec
    }

    pub fn entries(&self) -> &[CommandSpec] {
        &self.entries
    }

    /// Check the catalog invariants: non-empty, one entry per command, at
    /// least one non-blank phrase each, and action codes unique.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen_codes: BTreeMap<u8, Command> = BTreeMap::new();
        let mut seen_cmds = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            if seen_cmds.contains(&e.command) {
                return Err(CatalogError::DuplicateCommand(e.command));
            }
            seen_cmds.push(e.command);
            if e.phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(CatalogError::NoPhrases(e.command));
            }
            if let Some(first) = seen_codes.insert(e.code, e.command) {
                return Err(CatalogError::DuplicateCode {
                    code: e.code,
                    first,
                    second: e.command,
                });
            }
        }
        Ok(())
    }
}

/// Read catalog overrides from a YAML file keyed by command id.
pub fn load_catalog_file(path: impl AsRef<Path>) -> anyhow::Result<CatalogSpec> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading catalog: {}", path.display()))?;
    let overrides: BTreeMap<Command, CommandOverride> = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing catalog yaml: {}", path.display()))?;
    let spec = CatalogSpec::with_overrides(&overrides);
    spec.validate()
        .with_context(|| format!("validating catalog: {}", path.display()))?;
    Ok(spec)
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub command: Command,
    pub code: u8,
    pub phrases: Vec<String>,
    pub embeddings: Vec<Embedding>,
}

/// Validated commands with precomputed phrase embeddings. Read-only once built.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    model: String,
}

impl Catalog {
    /// Validate `spec` and embed every example phrase, one batch per command.
    pub fn build(spec: CatalogSpec, provider: &dyn EmbeddingProvider) -> Result<Self, CatalogError> {
        spec.validate()?;
        let mut entries = Vec::with_capacity(spec.entries.len());
        for e in spec.entries {
            let phrases: Vec<String> = e
                .phrases
                .iter()
                .map(|p| normalize_utterance(p))
                .filter(|p| !p.is_empty())
                .collect();
            let refs: Vec<&str> = phrases.iter().map(String::as_str).collect();
            let embeddings = embed_batch_normalized(provider, &refs)?;
            debug!(command = %e.command, phrases = phrases.len(), "embedded example phrases");
            entries.push(CatalogEntry {
                command: e.command,
                code: e.code,
                phrases,
                embeddings,
            });
        }
        if let Some(dim) = entries.first().and_then(|e| e.embeddings.first()).map(Embedding::dim) {
            for e in &entries {
                if let Some(bad) = e.embeddings.iter().find(|v| v.dim() != dim) {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: dim,
                        got: bad.dim(),
                    }
                    .into());
                }
            }
        }
        info!(
            model = provider.name(),
            commands = entries.len(),
            "command catalog ready"
        );
        Ok(Self {
            entries,
            model: provider.name().to_string(),
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn code_of(&self, command: Command) -> Option<u8> {
        self.entry(command).map(|e| e.code)
    }

    pub fn command_for_code(&self, code: u8) -> Option<Command> {
        self.entries.iter().find(|e| e.code == code).map(|e| e.command)
    }

    pub fn entry(&self, command: Command) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.command == command)
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::HashingEmbedder;
    use std::io::Write;

    #[test]
    fn default_spec_is_valid() {
        let spec = CatalogSpec::default();
        spec.validate().unwrap();
        assert_eq!(spec.entries().len(), Command::ALL.len());
    }

    #[test]
    fn rejects_empty_catalog() {
        let spec = CatalogSpec::from_entries(vec![]);
        assert!(matches!(spec.validate(), Err(CatalogError::Empty)));
        assert!(matches!(
            Catalog::build(spec, &HashingEmbedder::default()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn rejects_command_without_phrases() {
        let spec = CatalogSpec::from_entries(vec![CommandSpec {
            command: Command::Stop,
            code: 5,
            phrases: vec!["   ".to_string()],
        }]);
        assert!(matches!(
            spec.validate(),
            Err(CatalogError::NoPhrases(Command::Stop))
        ));
    }

    #[test]
    fn rejects_shared_action_code() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            Command::Left,
            CommandOverride {
                code: Some(0x01),
                phrases: None,
            },
        );
        let spec = CatalogSpec::with_overrides(&overrides);
        assert!(matches!(
            spec.validate(),
            Err(CatalogError::DuplicateCode {
                code: 0x01,
                first: Command::Forward,
                second: Command::Left
            })
        ));
    }

    #[test]
    fn builds_one_embedding_per_phrase() {
        let catalog = Catalog::build(CatalogSpec::default(), &HashingEmbedder::default()).unwrap();
        for e in catalog.entries() {
            assert_eq!(e.embeddings.len(), e.phrases.len());
            assert_eq!(catalog.code_of(e.command), Some(e.code));
            assert_eq!(catalog.command_for_code(e.code), Some(e.command));
        }
        assert_eq!(catalog.model(), "hashing-bow");
    }

    #[test]
    fn loads_overrides_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "stop:\n  code: 0x10\n  phrases: [\"dừng ngay\", \"đứng lại\"]\nleft:\n  phrases: [\"trái\"]"
        )
        .unwrap();
        let spec = load_catalog_file(file.path()).unwrap();
        let stop = spec
            .entries()
            .iter()
            .find(|e| e.command == Command::Stop)
            .unwrap();
        assert_eq!(stop.code, 0x10);
        assert_eq!(stop.phrases, vec!["dừng ngay", "đứng lại"]);
        let forward = &spec.entries()[0];
        assert_eq!(forward.code, 0x01);
    }

    #[test]
    fn load_rejects_unknown_command() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "jump:\n  code: 9").unwrap();
        assert!(load_catalog_file(file.path()).is_err());
    }
}
