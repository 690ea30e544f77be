use chrono::{DateTime, Utc};
use log::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Type alias for subscriber IDs (the web layer hands over the verified identity as a String)
pub type SubscriberId = String;

/// Identity recorded for connections accepted without credentials.
pub const ANONYMOUS_SUBSCRIBER: &str = "anonymous";

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live transport session as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub connection_id: ConnectionId,
    pub subscriber_id: SubscriberId,
    pub established_at: DateTime<Utc>,
}

/// Connections resolved for a targeted delivery, read under a single lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedSnapshot {
    /// Registry-wide connection count when the snapshot was taken
    pub total_connections: usize,
    /// Deduplicated connection ids of the requested subscribers, in request order
    pub connection_ids: Vec<ConnectionId>,
}

#[derive(Debug)]
struct Entry {
    connection: Connection,
    // Registration sequence number, gives a stable enumeration order
    seq: u64,
}

#[derive(Debug, Default)]
struct Indexes {
    next_seq: u64,
    /// Primary storage: lookup by connection_id for registration/cleanup
    connections: HashMap<ConnectionId, Entry>,
    /// Secondary index: lookup by subscriber for message routing, ordered by registration
    subscriber_index: HashMap<SubscriberId, BTreeMap<u64, ConnectionId>>,
    /// Registration order across all connections
    order: BTreeMap<u64, ConnectionId>,
}

impl Indexes {
    fn insert(&mut self, connection: Connection) -> Option<Connection> {
        let replaced = self.remove(&connection.connection_id);

        let seq = self.next_seq;
        self.next_seq += 1;

        let connection_id = connection.connection_id.clone();
        self.subscriber_index
            .entry(connection.subscriber_id.clone())
            .or_default()
            .insert(seq, connection_id.clone());
        self.order.insert(seq, connection_id.clone());
        self.connections
            .insert(connection_id, Entry { connection, seq });

        replaced
    }

    fn remove(&mut self, connection_id: &ConnectionId) -> Option<Connection> {
        let Entry { connection, seq } = self.connections.remove(connection_id)?;

        self.order.remove(&seq);
        if let Some(subscriber_connections) =
            self.subscriber_index.get_mut(&connection.subscriber_id)
        {
            subscriber_connections.remove(&seq);

            // Clean up empty subscriber entries
            if subscriber_connections.is_empty() {
                self.subscriber_index.remove(&connection.subscriber_id);
            }
        }

        Some(connection)
    }

    fn connections_of(&self, subscriber_id: &str) -> Vec<ConnectionId> {
        self.subscriber_index
            .get(subscriber_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }
}

/// Process-local registry of live connections with dual indices.
///
/// Both indices live behind one lock so a reader never observes the
/// by-connection and by-subscriber views out of step with each other.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    indexes: RwLock<Indexes>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation leaves both indices consistent before returning, so a
    // poisoned lock still guards valid state.
    fn read(&self) -> RwLockReadGuard<'_, Indexes> {
        self.indexes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Indexes> {
        self.indexes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection under `subscriber_id`.
    ///
    /// Re-registering an existing `connection_id` replaces the previous entry,
    /// even when it belonged to another subscriber, and the connection moves to
    /// the end of the registration order. Returns the replaced entry, if any.
    pub fn add(
        &self,
        subscriber_id: SubscriberId,
        connection_id: ConnectionId,
    ) -> Option<Connection> {
        let connection = Connection {
            connection_id,
            subscriber_id,
            established_at: Utc::now(),
        };
        debug!(
            "Registering connection {} for subscriber {}",
            connection.connection_id, connection.subscriber_id
        );

        let replaced = self.write().insert(connection);
        if let Some(previous) = &replaced {
            debug!(
                "Connection {} re-registered, replacing entry for subscriber {}",
                previous.connection_id, previous.subscriber_id
            );
        }
        replaced
    }

    /// Remove a connection. Removing an unknown id is a no-op.
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let removed = self.write().remove(connection_id);
        if let Some(connection) = &removed {
            debug!(
                "Removed connection {} for subscriber {}",
                connection.connection_id, connection.subscriber_id
            );
        }
        removed
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.read()
            .connections
            .get(connection_id)
            .map(|entry| entry.connection.clone())
    }

    /// All live connections of a subscriber, in registration order.
    pub fn connections_of(&self, subscriber_id: &str) -> Vec<ConnectionId> {
        self.read().connections_of(subscriber_id)
    }

    /// Snapshot of every registered connection id, in registration order.
    pub fn all_connection_ids(&self) -> Vec<ConnectionId> {
        self.read().order.values().cloned().collect()
    }

    /// Resolve the connections of several subscribers at once.
    ///
    /// Subscribers are visited in the given order. A connection is listed once
    /// even if its subscriber is requested more than once.
    pub fn targeted_snapshot(&self, subscriber_ids: &[SubscriberId]) -> TargetedSnapshot {
        let indexes = self.read();
        let mut seen = HashSet::new();
        let connection_ids = subscriber_ids
            .iter()
            .flat_map(|subscriber_id| indexes.connections_of(subscriber_id))
            .filter(|connection_id| seen.insert(connection_id.clone()))
            .collect();

        TargetedSnapshot {
            total_connections: indexes.connections.len(),
            connection_ids,
        }
    }

    pub fn distinct_subscribers(&self) -> HashSet<SubscriberId> {
        self.read().subscriber_index.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().connections.len()
    }

    pub fn is_online(&self, subscriber_id: &str) -> bool {
        self.read().subscriber_index.contains_key(subscriber_id)
    }
}
