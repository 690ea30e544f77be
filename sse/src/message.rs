use crate::notification::{Notification, Origin, Priority};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{Map, Value};

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Shape of a notification as delivered to subscribers.
///
/// Subscriber-side clients parse this, so field names and formats must not drift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    pub priority: Priority,
    /// RFC 3339, millisecond precision, UTC (`2024-05-01T12:00:00.000Z`)
    pub timestamp: String,
    pub source: Origin,
}

impl From<&Notification> for WireNotification {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id().to_string(),
            kind: notification.kind().to_string(),
            message: notification.message().to_string(),
            data: notification.data().cloned(),
            priority: notification.priority(),
            timestamp: notification
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            source: notification.origin(),
        }
    }
}

impl EventType for WireNotification {
    fn event_type(&self) -> &'static str {
        "notification"
    }
}

/// First event on every stream, tells the client which connection it holds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub connection_id: String,
    pub subscriber_id: String,
    pub timestamp: String,
}

impl EventType for Connected {
    fn event_type(&self) -> &'static str {
        "connected"
    }
}
