//! conversation: what the assistant says when an utterance is not a robot
//! command.
//!
//! [`Responder`] keeps a bounded [`ConversationMemory`] on disk, prompts a
//! [`ChatModel`] with the [`Persona`] and the history, and cleans the reply
//! with [`process_reply`] so it can be spoken.

mod error;
pub use error::{ConversationError, Result};

pub mod llm;
pub use llm::{ChatMessage, ChatModel, OllamaConfig, Role};
#[cfg(feature = "ollama")]
pub use llm::OllamaClient;

pub mod memory;
pub use memory::{ConversationMemory, MemoryStats, StoredMessage, DEFAULT_MAX_HISTORY};

mod persona;
pub use persona::Persona;

mod responder;
pub use responder::Responder;

pub mod text;
pub use text::{
    clean_special_chars, limit_length, process_reply, sanitize_user_input,
    DEFAULT_MAX_REPLY_CHARS,
};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::ScriptedModel;
