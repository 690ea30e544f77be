//! Normalization of producer payloads into immutable notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Delivery priority of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PriorityParseError;

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(value: &str) -> Result<Priority, Self::Err> {
        match value {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(PriorityParseError),
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a notification entered the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Submitted by an external producer through the ingress endpoint
    Webhook,
}

/// Producer payload after boundary validation.
///
/// `priority` is kept raw; out-of-range values fall back to `normal` during
/// normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPayload {
    pub kind: String,
    pub message: String,
    pub data: Option<Map<String, Value>>,
    pub priority: Option<String>,
}

/// An immutable notification, valid for the duration of one delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    id: Uuid,
    kind: String,
    message: String,
    data: Option<Map<String, Value>>,
    priority: Priority,
    created_at: DateTime<Utc>,
    origin: Origin,
}

impl Notification {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// Turns a validated payload into a [`Notification`].
///
/// The relay is the only source of notification ids; nothing the producer
/// sends is used as one.
pub fn normalize(payload: NotificationPayload) -> Notification {
    let priority = payload
        .priority
        .as_deref()
        .and_then(|priority| priority.parse().ok())
        .unwrap_or_default();

    Notification {
        id: Uuid::new_v4(),
        kind: payload.kind,
        message: payload.message,
        data: payload.data,
        priority,
        created_at: Utc::now(),
        origin: Origin::Webhook,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(priority: Option<&str>) -> NotificationPayload {
        NotificationPayload {
            kind: "info".to_string(),
            message: "hi".to_string(),
            data: None,
            priority: priority.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_copies_type_and_message() {
        let notification = normalize(payload(None));

        assert_eq!(notification.kind(), "info");
        assert_eq!(notification.message(), "hi");
        assert_eq!(notification.origin(), Origin::Webhook);
    }

    #[test]
    fn test_normalize_keeps_valid_priorities() {
        assert_eq!(normalize(payload(Some("low"))).priority(), Priority::Low);
        assert_eq!(normalize(payload(Some("normal"))).priority(), Priority::Normal);
        assert_eq!(normalize(payload(Some("high"))).priority(), Priority::High);
    }

    #[test]
    fn test_normalize_defaults_missing_or_invalid_priority_to_normal() {
        assert_eq!(normalize(payload(None)).priority(), Priority::Normal);
        assert_eq!(normalize(payload(Some("urgent"))).priority(), Priority::Normal);
        assert_eq!(normalize(payload(Some("HIGH"))).priority(), Priority::Normal);
        assert_eq!(normalize(payload(Some(""))).priority(), Priority::Normal);
    }

    #[test]
    fn test_normalize_assigns_fresh_ids() {
        let first = normalize(payload(None));
        let second = normalize(payload(None));

        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_normalize_passes_data_through_unmodified() {
        let data = json!({"orderId": 42, "tags": ["a", "b"], "nested": {"x": null}});
        let mut with_data = payload(None);
        with_data.data = data.as_object().cloned();

        let notification = normalize(with_data);

        assert_eq!(
            Value::Object(notification.data().unwrap().clone()),
            data
        );
    }

    #[test]
    fn test_normalize_keeps_absent_data_absent() {
        assert!(normalize(payload(None)).data().is_none());
    }

    #[test]
    fn test_normalize_sets_created_at_to_now() {
        let before = Utc::now();
        let notification = normalize(payload(None));
        let after = Utc::now();

        assert!(notification.created_at() >= before);
        assert!(notification.created_at() <= after);
    }
}
