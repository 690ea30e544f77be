//! Resolves delivery targets and pushes notifications through a [`Transport`].
//!
//! Every connection in a target set gets its own attempt, bounded by the send
//! timeout. A failed or timed out attempt is recorded in the outcome and the
//! connection is evicted from the registry; the remaining attempts carry on.

use crate::connection::{ConnectionId, ConnectionRegistry, SubscriberId};
use crate::error::{empty_target_error, Error};
use crate::message::WireNotification;
use crate::notification::Notification;
use crate::outcome::{DeliveryFailure, DeliveryOutcome, FailureReason, TargetType};
use crate::transport::Transport;
use futures::future::join_all;
use log::*;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DeliveryEngine {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn Transport>,
    send_timeout: Duration,
}

impl DeliveryEngine {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        transport: Arc<dyn Transport>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            send_timeout,
        }
    }

    /// Deliver to every connection registered at call time.
    pub async fn broadcast(&self, notification: &Notification) -> DeliveryOutcome {
        let targets = self.registry.all_connection_ids();
        let total_clients = targets.len();

        let (delivered, failed) = self.deliver(notification, &targets).await;

        info!(
            "Broadcast notification {} delivered to {}/{} connection(s), {} failed",
            notification.id(),
            delivered.len(),
            total_clients,
            failed.len()
        );

        DeliveryOutcome {
            target_type: TargetType::Broadcast,
            total_clients,
            delivered,
            failed,
            target_users: None,
        }
    }

    /// Deliver to the live connections of the given subscribers.
    ///
    /// `None` or an empty list is rejected before any send is attempted, so a
    /// missing target list can never turn into a broadcast. Subscribers without
    /// connections are not an error; they simply receive nothing.
    pub async fn send_to_users(
        &self,
        notification: &Notification,
        subscriber_ids: Option<&[SubscriberId]>,
    ) -> Result<DeliveryOutcome, Error> {
        let subscriber_ids = match subscriber_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => {
                warn!(
                    "Rejecting targeted delivery of notification {} without subscribers",
                    notification.id()
                );
                return Err(empty_target_error(
                    "targeted delivery requires at least one subscriber id",
                ));
            }
        };

        let snapshot = self.registry.targeted_snapshot(subscriber_ids);
        let (delivered, failed) = self
            .deliver(notification, &snapshot.connection_ids)
            .await;

        info!(
            "Targeted notification {} delivered to {} connection(s) of {} subscriber(s), {} failed",
            notification.id(),
            delivered.len(),
            subscriber_ids.len(),
            failed.len()
        );

        Ok(DeliveryOutcome {
            target_type: TargetType::Targeted,
            total_clients: snapshot.total_connections,
            delivered,
            failed,
            target_users: Some(subscriber_ids.to_vec()),
        })
    }

    async fn deliver(
        &self,
        notification: &Notification,
        targets: &[ConnectionId],
    ) -> (Vec<ConnectionId>, Vec<DeliveryFailure>) {
        let wire = WireNotification::from(notification);
        let results = join_all(
            targets
                .iter()
                .map(|connection_id| self.attempt(connection_id, &wire)),
        )
        .await;

        let mut delivered = Vec::with_capacity(targets.len());
        let mut failed = Vec::new();
        for (connection_id, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => delivered.push(connection_id.clone()),
                Err(reason) => {
                    warn!(
                        "Failed to deliver notification {} to connection {}: {}. Evicting connection.",
                        notification.id(),
                        connection_id,
                        reason
                    );
                    self.evict(connection_id);
                    failed.push(DeliveryFailure {
                        connection_id: connection_id.clone(),
                        reason,
                    });
                }
            }
        }

        (delivered, failed)
    }

    async fn attempt(
        &self,
        connection_id: &ConnectionId,
        wire: &WireNotification,
    ) -> Result<(), FailureReason> {
        match tokio::time::timeout(self.send_timeout, self.transport.send(connection_id, wire))
            .await
        {
            Ok(Ok(())) => {
                trace!("Delivered notification {} to {}", wire.id, connection_id);
                Ok(())
            }
            Ok(Err(err)) => Err(FailureReason::Send(err)),
            Err(_) => Err(FailureReason::TimedOut(self.send_timeout)),
        }
    }

    fn evict(&self, connection_id: &ConnectionId) {
        self.registry.remove(connection_id);
        self.transport.release(connection_id);
    }
}
