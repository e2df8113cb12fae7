//! Conversation types and transcript management

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a message within one conversation.
///
/// Ids are handed out in creation order, so comparing two ids tells which
/// message was created first. The welcome message always has id `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const WELCOME: MessageId = MessageId(0);
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::WELCOME {
            write!(f, "welcome")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Local wall-clock time as `HH:MM`, the way the chat bubbles show it
    pub fn display_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Append-only log of the messages exchanged in one session.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Start a transcript holding only the assistant's welcome message
    pub fn with_welcome(content: &str, at: DateTime<Utc>) -> Self {
        Self {
            messages: vec![Message {
                id: MessageId::WELCOME,
                role: Role::Assistant,
                content: content.to_string(),
                timestamp: at,
            }],
            next_id: 1,
        }
    }

    pub fn add_user(&mut self, content: &str, at: DateTime<Utc>) -> MessageId {
        self.push(Role::User, content, at)
    }

    pub fn add_assistant(&mut self, content: &str, at: DateTime<Utc>) -> MessageId {
        self.push(Role::Assistant, content, at)
    }

    fn push(&mut self, role: Role, content: &str, at: DateTime<Utc>) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;

        // Timestamps never go backwards, even if the wall clock does.
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };

        self.messages.push(Message {
            id,
            role,
            content: content.to_string(),
            timestamp,
        });
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
