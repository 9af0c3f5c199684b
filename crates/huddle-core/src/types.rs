//! Channel message types.

use serde::{Deserialize, Serialize};

/// Incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub channel: String,
    /// Channel/thread the message arrived on — replies go back here.
    pub thread_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: String,
    pub thread_type: ThreadType,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Outgoing message to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub thread_id: String,
    pub content: String,
    pub thread_type: ThreadType,
}

impl OutgoingMessage {
    /// Reply into the thread an incoming message came from.
    pub fn reply_to(incoming: &IncomingMessage, content: impl Into<String>) -> Self {
        Self {
            thread_id: incoming.thread_id.clone(),
            content: content.into(),
            thread_type: incoming.thread_type.clone(),
        }
    }
}

/// Thread type for channel messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    Direct,
    Group,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(content: &str) -> IncomingMessage {
        IncomingMessage {
            channel: "discord".into(),
            thread_id: "42".into(),
            sender_id: "7".into(),
            sender_name: Some("lena".into()),
            content: content.into(),
            thread_type: ThreadType::Group,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_reply_targets_origin_thread() {
        let msg = incoming("!events");
        let out = OutgoingMessage::reply_to(&msg, "no events");
        assert_eq!(out.thread_id, "42");
        assert_eq!(out.thread_type, ThreadType::Group);
        assert_eq!(out.content, "no events");
    }

    #[test]
    fn test_message_json_roundtrip() {
        let msg = incoming("!reply \"Game Night\" yes");
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: IncomingMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.content, msg.content);
        assert_eq!(parsed.sender_id, "7");
    }
}
