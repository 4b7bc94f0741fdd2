use crate::{ChatMessage, ChatModel, ConversationError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Answers from a fixed queue and keeps every request it receives.
/// Fails with `EmptyResponse` once the queue runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    replies: VecDeque<String>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            requests: Arc::default(),
        }
    }

    /// Shared view of the requests, usable after the model is moved.
    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<ChatMessage>>>> {
        Arc::clone(&self.requests)
    }
}

impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat(&mut self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().push(messages.to_vec());
        self.replies
            .pop_front()
            .ok_or(ConversationError::EmptyResponse)
    }
}
