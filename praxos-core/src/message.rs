//! Conversation messages

use crate::PraxosError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(alias = "author")]
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Convert a `{"role"|"author": .., "content": ..}` map.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        if !value.is_object() {
            return Err(PraxosError::validation(format!(
                "message must be an object, got {}",
                value
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| PraxosError::validation(format!("invalid message: {}", e)))
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "role": self.role, "content": self.content })
    }
}

/// Input accepted by `add_conversation`: a typed message or a raw map
/// that still needs converting.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEntry {
    Message(Message),
    Raw(Value),
}

impl ConversationEntry {
    pub fn into_message(self) -> crate::Result<Message> {
        match self {
            ConversationEntry::Message(message) => Ok(message),
            ConversationEntry::Raw(value) => Message::from_value(value),
        }
    }
}

impl From<Message> for ConversationEntry {
    fn from(message: Message) -> Self {
        ConversationEntry::Message(message)
    }
}

impl From<Value> for ConversationEntry {
    fn from(value: Value) -> Self {
        ConversationEntry::Raw(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_author_alias() {
        let message = Message::from_value(json!({"author": "bot", "content": "hello"})).unwrap();
        assert_eq!(message, Message::new("bot", "hello"));
        assert_eq!(message.to_value(), json!({"role": "bot", "content": "hello"}));
    }

    #[test]
    fn test_from_value_rejects_malformed() {
        assert!(Message::from_value(json!({"role": "user"})).is_err());
        assert!(Message::from_value(json!("hi")).is_err());
    }

    #[test]
    fn test_entries_normalize() {
        let entries: Vec<ConversationEntry> = vec![
            Message::user("hi").into(),
            json!({"role": "assistant", "content": "hey"}).into(),
        ];
        let messages: Vec<Message> = entries
            .into_iter()
            .map(ConversationEntry::into_message)
            .collect::<crate::Result<_>>()
            .unwrap();
        assert_eq!(messages[1], Message::assistant("hey"));
    }
}
