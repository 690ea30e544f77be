use crate::connection::{ConnectionId, ConnectionRegistry, SubscriberId};
use crate::delivery::{DeliveryEngine, DEFAULT_SEND_TIMEOUT};
use crate::error::Error;
use crate::message::{EventType, WireNotification};
use crate::notification::Notification;
use crate::outcome::DeliveryOutcome;
use crate::transport::{SendError, Transport};
use async_trait::async_trait;
use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub type EventSender = mpsc::Sender<Result<Event, Infallible>>;
pub type EventReceiver = mpsc::Receiver<Result<Event, Infallible>>;

pub const DEFAULT_BUFFER_SIZE: usize = 64;

/// SSE implementation of the send primitive: one bounded channel per connection,
/// drained by that connection's response stream.
#[derive(Default)]
pub struct SseTransport {
    channels: DashMap<ConnectionId, EventSender>,
}

impl SseTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self, connection_id: ConnectionId, sender: EventSender) {
        self.channels.insert(connection_id, sender);
    }

    fn close(&self, connection_id: &ConnectionId) {
        self.channels.remove(connection_id);
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn send(
        &self,
        connection_id: &ConnectionId,
        notification: &WireNotification,
    ) -> Result<(), SendError> {
        // Clone the sender so no map shard stays locked across the await
        let sender = self
            .channels
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or(SendError::ConnectionGone)?;

        let data = serde_json::to_string(notification)
            .map_err(|e| SendError::Encoding(e.to_string()))?;
        let event = Event::default()
            .event(notification.event_type())
            .id(notification.id.clone())
            .data(data);

        sender.send(Ok(event)).await.map_err(|_| SendError::Closed)
    }

    fn release(&self, connection_id: &ConnectionId) {
        // Dropping the sender ends the response stream, which closes the client side
        self.close(connection_id);
    }
}

/// Connection gateway and delivery entry point shared by the web layer.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<SseTransport>,
    engine: DeliveryEngine,
    buffer_size: usize,
}

impl Manager {
    pub fn new(send_timeout: Duration, buffer_size: usize) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let transport = Arc::new(SseTransport::new());
        let engine = DeliveryEngine::new(registry.clone(), transport.clone(), send_timeout);

        Self {
            registry,
            transport,
            engine,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Register a new connection for an already verified subscriber.
    ///
    /// Returns the connection id and the receiving end of its event channel.
    pub fn register_connection(
        &self,
        subscriber_id: SubscriberId,
    ) -> (ConnectionId, EventReceiver) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.buffer_size);

        self.transport.open(connection_id.clone(), tx);
        self.registry.add(subscriber_id, connection_id.clone());
        info!(
            "Registered new SSE connection {} ({} open)",
            connection_id,
            self.registry.count()
        );

        (connection_id, rx)
    }

    /// Unregister a connection by ID. Safe to call more than once.
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        self.transport.close(connection_id);
        if self.registry.remove(connection_id).is_some() {
            info!(
                "Unregistered SSE connection {} ({} open)",
                connection_id,
                self.registry.count()
            );
        }
    }

    pub async fn broadcast(&self, notification: &Notification) -> DeliveryOutcome {
        self.engine.broadcast(notification).await
    }

    pub async fn send_to_users(
        &self,
        notification: &Notification,
        subscriber_ids: Option<&[SubscriberId]>,
    ) -> Result<DeliveryOutcome, Error> {
        self.engine.send_to_users(notification, subscriber_ids).await
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT, DEFAULT_BUFFER_SIZE)
    }
}

/// Unregisters its connection when dropped.
///
/// Held by the response stream, so the connection is removed however the
/// stream ends, including a client that vanishes without closing cleanly.
pub struct ConnectionGuard {
    manager: Arc<Manager>,
    connection_id: ConnectionId,
}

impl ConnectionGuard {
    pub fn new(manager: Arc<Manager>, connection_id: ConnectionId) -> Self {
        Self {
            manager,
            connection_id,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!("SSE connection {} closed, cleaning up", self.connection_id);
        self.manager.unregister_connection(&self.connection_id);
    }
}
