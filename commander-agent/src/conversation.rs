//! Conversation state shared by every reasoning stage.
//!
//! The log is append-only: messages are never edited, removed or reordered,
//! and the order is the context window the models see.

use commander_model::{ChatMessage, Role};

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a session from the system instruction and the user's question
    pub fn seeded(system: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(question)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The first user message
    pub fn question(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// A copy of the log with one trailing instruction, for a single model
    /// call. The log itself is left untouched.
    pub fn with_instruction(&self, instruction: ChatMessage) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend(self.messages.iter().cloned());
        messages.push(instruction);
        messages
    }
}
