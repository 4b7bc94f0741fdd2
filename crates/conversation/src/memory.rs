use crate::llm::{ChatMessage, Role};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_HISTORY: usize = 20;

/// One stored turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    /// RFC 3339; kept as text so files written elsewhere still load.
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoryFile {
    #[serde(default)]
    history: Vec<StoredMessage>,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub memory_file: PathBuf,
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// Bounded conversation history persisted as a JSON file.
///
/// Only the newest `max_history` messages are kept, and the file is rewritten
/// after every change.
#[derive(Debug)]
pub struct ConversationMemory {
    path: PathBuf,
    max_history: usize,
    history: Vec<StoredMessage>,
}

impl ConversationMemory {
    /// Open the memory at `path`. A missing, unreadable or corrupt file
    /// starts an empty history instead of failing.
    pub fn open(path: impl Into<PathBuf>, max_history: usize) -> Self {
        let mut memory = Self {
            path: path.into(),
            max_history: max_history.max(1),
            history: Vec::new(),
        };
        memory.load();
        memory
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn history(&self) -> &[StoredMessage] {
        &self.history
    }

    /// Re-read the file, replacing the in-memory history.
    pub fn load(&mut self) {
        self.history = match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<MemoryFile>(&raw) {
                Ok(file) => {
                    info!(messages = file.history.len(), path = %self.path.display(), "loaded conversation memory");
                    file.history
                }
                Err(e) => {
                    warn!(error = %e, path = %self.path.display(), "corrupt memory file, starting fresh");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "new conversation");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "cannot read memory file, starting fresh");
                Vec::new()
            }
        };
        self.trim();
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = MemoryFile {
            history: self.history.clone(),
            last_updated: Some(now_rfc3339()),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        debug!(messages = self.history.len(), "saved conversation memory");
        Ok(())
    }

    /// Append a turn and persist. The turn is kept in memory even when the
    /// save fails.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) -> Result<()> {
        self.history.push(StoredMessage {
            role,
            content: content.into(),
            timestamp: now_rfc3339(),
        });
        self.trim();
        self.save()
    }

    fn trim(&mut self) {
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    /// History in chat-request form, oldest first.
    pub fn context(&self, include_timestamps: bool) -> Vec<ChatMessage> {
        self.history
            .iter()
            .map(|m| {
                let content = if include_timestamps {
                    format!("[{}] {}", m.timestamp, m.content)
                } else {
                    m.content.clone()
                };
                ChatMessage {
                    role: m.role,
                    content,
                }
            })
            .collect()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.history.clear();
        info!(path = %self.path.display(), "conversation memory cleared");
        self.save()
    }

    /// The newest `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> &[StoredMessage] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub fn stats(&self) -> MemoryStats {
        let count = |role: Role| self.history.iter().filter(|m| m.role == role).count();
        MemoryStats {
            total_messages: self.history.len(),
            user_messages: count(Role::User),
            assistant_messages: count(Role::Assistant),
            memory_file: self.path.clone(),
        }
    }
}
