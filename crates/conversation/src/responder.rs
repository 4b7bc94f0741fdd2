use crate::llm::{ChatMessage, ChatModel, Role};
use crate::memory::ConversationMemory;
use crate::persona::Persona;
use crate::text::{process_reply, DEFAULT_MAX_REPLY_CHARS};
use crate::Result;
use tracing::{info, warn};

/// Free-form conversation: remembers turns and asks the chat model.
pub struct Responder {
    model: Box<dyn ChatModel>,
    memory: ConversationMemory,
    system_prompt: String,
    max_reply_chars: usize,
}

impl Responder {
    pub fn new(model: Box<dyn ChatModel>, memory: ConversationMemory, persona: &Persona) -> Self {
        Self {
            model,
            memory,
            system_prompt: persona.system_prompt(),
            max_reply_chars: DEFAULT_MAX_REPLY_CHARS,
        }
    }

    pub fn with_max_reply_chars(mut self, max_chars: usize) -> Self {
        self.max_reply_chars = max_chars;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    fn remember(&mut self, role: Role, content: &str) {
        if let Err(e) = self.memory.add_message(role, content) {
            warn!(error = %e, "failed to save conversation memory");
        }
    }

    /// Reply to `user_text`. The user turn is recorded before the model is
    /// called; an empty cleaned reply is returned as is and not recorded.
    pub fn respond(&mut self, user_text: &str) -> Result<String> {
        self.remember(Role::User, user_text);

        let mut messages = Vec::with_capacity(self.memory.len() + 1);
        messages.push(ChatMessage::new(Role::System, self.system_prompt.clone()));
        messages.extend(self.memory.context(false));

        let raw = self.model.chat(&messages)?;
        let reply = process_reply(raw.trim(), self.max_reply_chars);
        if reply.is_empty() {
            warn!(model = self.model.name(), "model reply empty after cleanup");
            return Ok(reply);
        }
        self.remember(Role::Assistant, &reply);
        info!(chars = reply.chars().count(), "assistant reply");
        Ok(reply)
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{ConversationError, ScriptedModel};

    fn responder(model: ScriptedModel, dir: &tempfile::TempDir) -> Responder {
        let memory = ConversationMemory::open(dir.path().join("memory.json"), 20);
        Responder::new(Box::new(model), memory, &Persona::default())
    }

    #[test]
    fn sends_system_prompt_then_history() {
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedModel::new(["Tôi là **Bảo**!!!", "Hôm nay trời đẹp."]);
        let requests = model.requests();
        let mut r = responder(model, &dir);

        assert_eq!(r.respond("bạn là ai").unwrap(), "Tôi là Bảo!");
        assert_eq!(r.respond("thời tiết thế nào").unwrap(), "Hôm nay trời đẹp.");

        let requests = requests.lock();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second[0].role, Role::System);
        assert!(second[0].content.contains("Bảo"));
        let turns: Vec<_> = second[1..].iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            turns,
            [
                (Role::User, "bạn là ai"),
                (Role::Assistant, "Tôi là Bảo!"),
                (Role::User, "thời tiết thế nào"),
            ]
        );
        assert_eq!(r.memory().len(), 4);
    }

    #[test]
    fn reply_is_length_limited() {
        let dir = tempfile::tempdir().unwrap();
        let long = "một hai ba bốn năm sáu bảy tám chín mười";
        let mut r = responder(ScriptedModel::new([long]), &dir).with_max_reply_chars(12);
        assert_eq!(r.respond("đếm đi").unwrap(), "một hai ba...");
    }

    #[test]
    fn empty_reply_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = responder(ScriptedModel::new(["  ***  "]), &dir);
        assert_eq!(r.respond("xin chào").unwrap(), "");
        assert_eq!(r.memory().len(), 1);
        assert_eq!(r.memory().history()[0].role, Role::User);
    }

    #[test]
    fn model_error_keeps_user_turn() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = responder(ScriptedModel::default(), &dir);
        assert!(matches!(
            r.respond("alo"),
            Err(ConversationError::EmptyResponse)
        ));
        assert_eq!(r.memory().len(), 1);
    }
}
