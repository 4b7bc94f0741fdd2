use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A chat-completion backend. Returns the raw assistant text.
pub trait ChatModel: Send {
    fn name(&self) -> &str;
    fn chat(&mut self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "gemma3:1b".to_string()
}

fn default_timeout() -> u64 {
    120
}

#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;

#[cfg(feature = "ollama")]
mod ollama {
    use super::{ChatMessage, ChatModel, OllamaConfig};
    use crate::{ConversationError, Result};
    use reqwest::blocking::Client;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tracing::debug;

    #[derive(Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        messages: &'a [ChatMessage],
        stream: bool,
    }

    #[derive(Deserialize)]
    struct ChatResponse {
        message: Option<ResponseMessage>,
    }

    #[derive(Deserialize)]
    struct ResponseMessage {
        content: String,
    }

    /// Non-streaming client for Ollama's `/api/chat`.
    pub struct OllamaClient {
        config: OllamaConfig,
        client: Client,
    }

    impl OllamaClient {
        pub fn new(config: OllamaConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs.max(1)))
                .build()
                .map_err(|e| ConversationError::Http(e.to_string()))?;
            Ok(Self { config, client })
        }

        fn url(&self) -> String {
            format!("{}/api/chat", self.config.host.trim_end_matches('/'))
        }
    }

    impl ChatModel for OllamaClient {
        fn name(&self) -> &str {
            &self.config.model
        }

        fn chat(&mut self, messages: &[ChatMessage]) -> Result<String> {
            let request = ChatRequest {
                model: &self.config.model,
                messages,
                stream: false,
            };
            let resp = self
                .client
                .post(self.url())
                .json(&request)
                .send()
                .map_err(|e| ConversationError::Http(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(ConversationError::Http(format!(
                    "ollama returned {}",
                    resp.status()
                )));
            }
            let body = resp
                .text()
                .map_err(|e| ConversationError::Http(e.to_string()))?;
            debug!(len = body.len(), "ollama response");
            let parsed: ChatResponse = serde_json::from_str(&body)?;
            parsed
                .message
                .map(|m| m.content.trim().to_string())
                .ok_or(ConversationError::EmptyResponse)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::Role;

        #[test]
        fn request_body_matches_chat_api() {
            let msgs = [ChatMessage::new(Role::System, "sys"), ChatMessage::new(Role::User, "chào")];
            let body = serde_json::to_value(ChatRequest {
                model: "gemma3:1b",
                messages: &msgs,
                stream: false,
            })
            .unwrap();
            assert_eq!(body["model"], "gemma3:1b");
            assert_eq!(body["stream"], false);
            assert_eq!(body["messages"][1]["role"], "user");
            assert_eq!(body["messages"][1]["content"], "chào");
        }

        #[test]
        fn url_tolerates_trailing_slash() {
            let c = OllamaClient::new(OllamaConfig {
                host: "http://localhost:11434/".into(),
                ..OllamaConfig::default()
            })
            .unwrap();
            assert_eq!(c.url(), "http://localhost:11434/api/chat");
        }
    }
}
