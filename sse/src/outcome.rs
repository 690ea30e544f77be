use crate::connection::{ConnectionId, SubscriberId};
use crate::transport::SendError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Broadcast,
    Targeted,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Broadcast => "broadcast",
            TargetType::Targeted => "targeted",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Send(SendError),
    /// The send did not complete within the per-connection timeout.
    TimedOut(Duration),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureReason::Send(err) => write!(f, "{err}"),
            FailureReason::TimedOut(after) => {
                write!(f, "send timed out after {}ms", after.as_millis())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub connection_id: ConnectionId,
    pub reason: FailureReason,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub target_type: TargetType,
    /// Connections registered when the attempt started. For targeted deliveries
    /// this is the registry-wide count, not the size of the targeted subset.
    pub total_clients: usize,
    /// Connections that accepted the notification, in attempt order
    pub delivered: Vec<ConnectionId>,
    /// Connections whose send failed; each was evicted from the registry
    pub failed: Vec<DeliveryFailure>,
    /// The subscriber ids a targeted delivery was asked for, verbatim
    pub target_users: Option<Vec<SubscriberId>>,
}

impl DeliveryOutcome {
    pub fn delivered_to(&self) -> usize {
        self.delivered.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// True when nobody was connected at all when the attempt started.
    pub fn no_clients(&self) -> bool {
        self.total_clients == 0
    }
}
