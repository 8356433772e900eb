//! Conversation message types
//!
//! Messages are append-only within a session; the summarizer never deletes
//! them, it only derives a summary over the compressed prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input
    User,
    /// Pipeline output
    Assistant,
}

impl Role {
    /// Role name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user message timestamped now
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create an assistant message timestamped now
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        let msg = Message::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::User);
        assert_eq!(back.content, "hello");
    }

    #[test]
    fn test_assistant_constructor() {
        let msg = Message::assistant("hi there");
        assert_eq!(msg.role.as_str(), "assistant");
    }
}
