use crate::sys::llm::{Message, Role, Turn};

pub const GREETING: &str =
    "반갑네, 여행자여. 나는 이 대륙의 역사를 기록하는 자라네. 아렌티나에 대해 궁금한 것이 있는가?";

/// Append-only message log for one session.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.append_model(greeting);
        log
    }

    /// Blank input is ignored and yields `None`.
    pub fn append_user(&mut self, text: impl Into<String>) -> Option<&Message> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        self.messages.push(Message::new(Role::User, text));
        self.messages.last()
    }

    pub fn append_model(&mut self, text: impl Into<String>) -> &Message {
        self.messages.push(Message::new(Role::Model, text));
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history(&self) -> Vec<Turn> {
        self.messages.iter().map(Message::turn).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
