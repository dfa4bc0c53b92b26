use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who wrote a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Bot,
}

impl Role {
    /// Name used in transcript markup (`message user`, `message bot`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }

    /// Name the remote chat backend expects in conversation history
    pub fn backend_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }

    /// History item in the shape the chat backend consumes
    pub fn to_backend(&self) -> BackendMessage {
        BackendMessage {
            role: self.role.backend_name().to_string(),
            content: self.content.clone(),
        }
    }
}

/// Conversation history item sent to the chat backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMessage {
    pub role: String,
    pub content: String,
}

/// Any message shape that can be displayed: a bare string, a role-tagged
/// entry, or a backend reply
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageInput {
    Text(String),
    Entry(ChatEntry),
    Reply { response: String },
}

impl MessageInput {
    /// Reads a message from JSON; `None` for unsupported shapes
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    pub fn content(&self) -> &str {
        match self {
            MessageInput::Text(text) => text,
            MessageInput::Entry(entry) => &entry.content,
            MessageInput::Reply { response } => response,
        }
    }

    /// Role of the message; replies and bare strings come from the bot
    pub fn role(&self) -> Role {
        match self {
            MessageInput::Entry(entry) => entry.role,
            MessageInput::Text(_) | MessageInput::Reply { .. } => Role::Bot,
        }
    }
}

impl From<MessageInput> for ChatEntry {
    fn from(input: MessageInput) -> Self {
        let role = input.role();
        match input {
            MessageInput::Entry(entry) => entry,
            MessageInput::Text(content) | MessageInput::Reply { response: content } => {
                ChatEntry { role, content }
            }
        }
    }
}
