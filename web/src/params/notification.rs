use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use sse::connection::SubscriberId;
use sse::notification::{NotificationPayload, Priority};
use utoipa::ToSchema;

use crate::Error;

/// Body of a producer notification submission.
///
/// Unknown fields are ignored, including any `id`: notification ids are
/// always assigned by the relay.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateParams {
    /// Free-form category of the notification
    #[serde(rename = "type")]
    #[schema(example = "order_shipped")]
    pub(crate) kind: String,
    /// Text body shown to subscribers
    #[schema(example = "Your order has shipped")]
    pub(crate) message: String,
    /// Subscriber ids to deliver to. Omit to broadcast to every connection.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Vec<String>>)]
    pub(crate) target_users: Option<Option<Vec<SubscriberId>>>,
    /// Opaque key-value payload passed through to subscribers unmodified
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Object>)]
    pub(crate) data: Option<Option<Map<String, Value>>>,
    /// One of `low`, `normal` (default) or `high`
    #[schema(example = "normal")]
    pub(crate) priority: Option<String>,
}

impl CreateParams {
    /// Checks the constraints serde cannot express.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.kind.trim().is_empty() {
            return Err(Error::validation("\"type\" is required"));
        }
        if self.message.trim().is_empty() {
            return Err(Error::validation("\"message\" is required"));
        }
        // Present but null: only an absent field means broadcast
        if let Some(None) = self.target_users {
            return Err(Error::validation("\"targetUsers\" must be an array"));
        }
        if let Some(None) = self.data {
            return Err(Error::validation("\"data\" must be an object"));
        }
        if let Some(Some(target_users)) = &self.target_users {
            if target_users.iter().any(|user| user.trim().is_empty()) {
                return Err(Error::validation(
                    "\"targetUsers\" must only contain non-empty subscriber ids",
                ));
            }
        }
        if let Some(priority) = &self.priority {
            if priority.parse::<Priority>().is_err() {
                return Err(Error::validation(
                    "\"priority\" must be one of low, normal, high",
                ));
            }
        }
        Ok(())
    }

    /// Splits the request into the payload to normalize and the optional target list.
    ///
    /// Call after [`CreateParams::validate`]; a null field is dropped here.
    pub(crate) fn into_parts(self) -> (NotificationPayload, Option<Vec<SubscriberId>>) {
        (
            NotificationPayload {
                kind: self.kind,
                message: self.message,
                data: self.data.flatten(),
                priority: self.priority,
            },
            self.target_users.flatten(),
        )
    }
}

/// Wraps any value that is present in the body, `null` included, in `Some`.
/// Paired with `#[serde(default)]` so an absent field stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebErrorKind;
    use serde_json::json;

    fn parse(body: Value) -> Result<CreateParams, serde_json::Error> {
        serde_json::from_value(body)
    }

    fn assert_invalid(body: Value) {
        let params = parse(body).unwrap();
        let err = params.validate().unwrap_err();
        assert!(matches!(err.error_kind, WebErrorKind::Validation(_)));
    }

    #[test]
    fn test_minimal_body_is_valid() {
        let params = parse(json!({"type": "info", "message": "hi"})).unwrap();

        assert!(params.validate().is_ok());
        assert!(params.target_users.is_none());
        assert!(params.data.is_none());
    }

    #[test]
    fn test_full_body_is_valid() {
        let params = parse(json!({
            "type": "info",
            "message": "hi",
            "targetUsers": ["alice", "bob"],
            "data": {"k": "v"},
            "priority": "high",
            "id": "producer-chosen-id"
        }))
        .unwrap();

        assert!(params.validate().is_ok());
        let (payload, target_users) = params.into_parts();
        assert_eq!(payload.kind, "info");
        assert_eq!(payload.priority.as_deref(), Some("high"));
        assert_eq!(payload.data, json!({"k": "v"}).as_object().cloned());
        assert_eq!(
            target_users,
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
    }

    #[test]
    fn test_missing_required_fields_fail_to_parse() {
        assert!(parse(json!({"message": "hi"})).is_err());
        assert!(parse(json!({"type": "info"})).is_err());
    }

    #[test]
    fn test_wrong_types_fail_to_parse() {
        assert!(parse(json!({"type": 1, "message": "hi"})).is_err());
        assert!(parse(json!({"type": "info", "message": "hi", "targetUsers": "alice"})).is_err());
        assert!(parse(json!({"type": "info", "message": "hi", "targetUsers": [1, 2]})).is_err());
        assert!(parse(json!({"type": "info", "message": "hi", "data": [1, 2]})).is_err());
        assert!(parse(json!({"type": "info", "message": "hi", "data": "text"})).is_err());
    }

    #[test]
    fn test_empty_required_fields_are_invalid() {
        assert_invalid(json!({"type": "", "message": "hi"}));
        assert_invalid(json!({"type": "info", "message": "   "}));
    }

    #[test]
    fn test_blank_target_user_is_invalid() {
        assert_invalid(json!({"type": "info", "message": "hi", "targetUsers": ["alice", ""]}));
    }

    #[test]
    fn test_unknown_priority_is_invalid() {
        assert_invalid(json!({"type": "info", "message": "hi", "priority": "urgent"}));
    }

    #[test]
    fn test_null_target_users_is_invalid() {
        let params =
            parse(json!({"type": "info", "message": "hi", "targetUsers": null})).unwrap();

        assert_eq!(params.target_users, Some(None));
        assert_invalid(json!({"type": "info", "message": "hi", "targetUsers": null}));
    }

    #[test]
    fn test_null_data_is_invalid() {
        assert_invalid(json!({"type": "info", "message": "hi", "data": null}));
    }

    #[test]
    fn test_empty_target_users_pass_validation() {
        // Rejected later as an empty target, not as a malformed body
        let params = parse(json!({"type": "info", "message": "hi", "targetUsers": []})).unwrap();
        assert!(params.validate().is_ok());
    }
}
