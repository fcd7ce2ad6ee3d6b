//! Notification Models
//!
//! The persisted notification entry and the messages pushed over the socket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Message,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Message => "message",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSender {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A notification held in the local history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<NotificationSender>,
}

impl AppNotification {
    /// Mint an unread entry with a fresh id and the current time
    pub fn from_payload(payload: NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: payload.kind,
            title: payload.title,
            message: payload.message,
            timestamp: Utc::now(),
            read: false,
            action: payload.action,
            sender: payload.sender,
        }
    }
}

/// Notification content as pushed by the server or raised locally. Any id,
/// timestamp or read flag the sender includes is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub action: Option<NotificationAction>,
    #[serde(default)]
    pub sender: Option<NotificationSender>,
}

impl NotificationPayload {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            action: None,
            sender: None,
        }
    }
}

/// Messages received on the notification socket
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Notification(NotificationPayload),
    /// Valid JSON that is not a notification envelope
    Ignored,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Envelope {
    Notification { notification: NotificationPayload },
}

impl InboundMessage {
    /// Decode a text frame. Only malformed JSON is an error; every other shape
    /// that is not a well-formed notification envelope is `Ignored`.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Ok(match serde_json::from_value::<Envelope>(value) {
            Ok(Envelope::Notification { notification }) => Self::Notification(notification),
            Err(_) => Self::Ignored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_notification_envelope() {
        let text = json!({
            "type": "notification",
            "notification": {
                "id": "server-id",
                "type": "message",
                "title": "New message",
                "message": "Hi there",
                "sender": {"name": "Grace"},
                "action": {"label": "Open", "href": "/dashboard/messages"}
            }
        })
        .to_string();

        let InboundMessage::Notification(payload) = InboundMessage::decode(&text).unwrap() else {
            panic!("expected a notification");
        };
        assert_eq!(payload.kind, NotificationKind::Message);
        assert_eq!(payload.sender.unwrap().name, "Grace");
        assert_eq!(payload.action.unwrap().href, "/dashboard/messages");
    }

    #[test]
    fn test_other_shapes_are_ignored() {
        for text in [
            r#"{"type": "ping"}"#,
            r#"{"notification": {"title": "no tag"}}"#,
            r#"{"type": "notification"}"#,
            r#"[1, 2, 3]"#,
            r#""hello""#,
        ] {
            assert_eq!(InboundMessage::decode(text).unwrap(), InboundMessage::Ignored, "{text}");
        }
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(InboundMessage::decode("{\"type\": ").is_err());
    }

    #[test]
    fn test_minted_notification_is_fresh() {
        let payload = NotificationPayload::new(NotificationKind::Success, "Saved", "Project saved");
        let first = AppNotification::from_payload(payload.clone());
        let second = AppNotification::from_payload(payload);

        assert_ne!(first.id, second.id);
        assert!(!first.read);
        assert_eq!(first.kind, NotificationKind::Success);
    }

    #[test]
    fn test_serialized_shape() {
        let mut notification =
            AppNotification::from_payload(NotificationPayload::new(NotificationKind::Warning, "Heads up", "Quota"));
        notification.timestamp = "2024-05-01T10:00:00Z".parse().unwrap();

        let value = serde_json::to_value(&notification).unwrap();

        assert_eq!(value["type"], "warning");
        assert_eq!(value["timestamp"], "2024-05-01T10:00:00Z");
        assert_eq!(value["read"], false);
        assert!(value.get("action").is_none());
    }
}
