//! Delivery summaries returned to producers.

use serde::Serialize;
use sse::connection::SubscriberId;
use sse::notification::Notification;
use sse::outcome::DeliveryOutcome;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DeliveryStatus {
    /// The notification was processed; some or all sends may still have failed
    Success,
    /// Nobody was connected when the notification arrived
    NoClients,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeliveryInfo {
    /// Connections registered when the delivery started
    pub(crate) total_clients: usize,
    /// Connections that accepted the notification
    pub(crate) delivered_to: usize,
    /// Connections whose send failed and were disconnected
    pub(crate) failed: usize,
    /// `broadcast` or `targeted`
    #[schema(example = "broadcast")]
    pub(crate) target_type: &'static str,
    /// Subscriber ids requested by a targeted delivery, as submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) target_users: Option<Vec<SubscriberId>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationResponse {
    pub(crate) notification_id: String,
    pub(crate) status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<&'static str>,
    pub(crate) delivery_info: DeliveryInfo,
}

impl NotificationResponse {
    pub(crate) fn new(notification: &Notification, outcome: DeliveryOutcome) -> Self {
        let (status, message) = if outcome.no_clients() {
            (DeliveryStatus::NoClients, Some("No clients connected"))
        } else {
            (DeliveryStatus::Success, None)
        };

        Self {
            notification_id: notification.id().to_string(),
            status,
            message,
            delivery_info: DeliveryInfo {
                total_clients: outcome.total_clients,
                delivered_to: outcome.delivered_to(),
                failed: outcome.failed_count(),
                target_type: outcome.target_type.as_str(),
                target_users: outcome.target_users,
            },
        }
    }
}

/// Presence of a single subscriber.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriberStatus {
    pub(crate) subscriber_id: SubscriberId,
    pub(crate) online: bool,
    /// Number of open connections held by the subscriber
    pub(crate) connections: usize,
}
