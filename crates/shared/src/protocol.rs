//! Realtime hub wire protocol.
//!
//! Both hubs speak the same frame shape: the server pushes
//! [`HubMessage`] frames dispatched by `target` name, the client sends
//! [`HubInvocation`] frames naming a server procedure. Payloads are
//! JSON values; each side deserializes the ones it knows.

use serde::{Deserialize, Serialize};

/// Server-to-client frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubMessage {
    pub target: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Client-to-server procedure call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubInvocation {
    pub id: String,
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

/// Hub endpoint paths, relative to the API base URL.
pub const CHAT_HUB_PATH: &str = "/hubs/chat";
pub const FRIEND_HUB_PATH: &str = "/hubs/friends";

/// Events pushed on the chat hub.
pub mod chat_events {
    pub const RECEIVE_MESSAGE: &str = "ReceiveMessage";
    pub const MESSAGE_SENT: &str = "MessageSent";
    pub const MESSAGE_READ: &str = "MessageRead";
    pub const ERROR: &str = "Error";
}

/// Events pushed on the friend hub.
pub mod friend_events {
    pub const REQUEST_RECEIVED: &str = "FriendRequestReceived";
    pub const REQUEST_ACCEPTED: &str = "FriendRequestAccepted";
    pub const REQUEST_REJECTED: &str = "FriendRequestRejected";
    pub const REQUEST_CANCELLED: &str = "FriendRequestCancelled";
    pub const FRIEND_REMOVED: &str = "FriendRemoved";
    pub const ERROR: &str = "Error";
}

/// Procedures invokable on the chat hub.
pub mod chat_procedures {
    pub const SEND_MESSAGE: &str = "SendMessage";
    pub const MARK_AS_READ: &str = "MarkAsRead";
}

/// Payload of `MessageRead`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageReadPayload {
    pub message_id: String,
    pub reader_id: String,
}

/// Payload of `FriendRequestCancelled`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestCancelledPayload {
    pub request_id: String,
}

/// Payload of `FriendRemoved`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRemovedPayload {
    pub user_id: String,
}

/// Payload of hub `Error` events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HubErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_message_tolerates_missing_data() {
        let msg: HubMessage = serde_json::from_str(r#"{"target":"MessageRead"}"#).unwrap();
        assert_eq!(msg.target, "MessageRead");
        assert!(msg.data.is_null());
    }

    #[test]
    fn invocation_round_trips_arguments() {
        let inv = HubInvocation {
            id: "i-1".into(),
            target: chat_procedures::SEND_MESSAGE.into(),
            arguments: vec![serde_json::json!("u-2"), serde_json::json!("hello")],
        };
        let json = serde_json::to_string(&inv).unwrap();
        let back: HubInvocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target, "SendMessage");
        assert_eq!(back.arguments.len(), 2);
    }
}
