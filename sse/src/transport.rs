use crate::connection::ConnectionId;
use crate::message::WireNotification;
use async_trait::async_trait;
use std::fmt;

/// Why a single send to one connection failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The transport holds no session for this connection id.
    ConnectionGone,
    /// The session exists but its receiving side has been dropped.
    Closed,
    /// The notification could not be encoded for this transport.
    Encoding(String),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SendError::ConnectionGone => write!(f, "connection no longer exists"),
            SendError::Closed => write!(f, "connection closed"),
            SendError::Encoding(reason) => write!(f, "failed to encode notification: {reason}"),
        }
    }
}

impl std::error::Error for SendError {}

/// Raw per-connection send primitive used by the delivery engine.
///
/// Implementations own the actual sessions; the engine only knows connection ids.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push one notification to one connection.
    async fn send(
        &self,
        connection_id: &ConnectionId,
        notification: &WireNotification,
    ) -> Result<(), SendError>;

    /// Drop any transport-side state for a connection evicted after a failed send.
    fn release(&self, _connection_id: &ConnectionId) {}
}
