//! Connection registry and delivery engine for the notification relay.
//!
//! Producers hand the relay notifications over HTTP; this crate fans them out
//! to open Server-Sent Events connections, either to everyone or to the
//! connections of a list of subscribers.
//!
//! # Architecture
//!
//! - **Multiple connections per subscriber**: a subscriber may hold any number
//!   of open streams (tabs, devices). Each one is registered separately.
//! - **Dual-index registry**: connection → subscriber and subscriber →
//!   connections, kept consistent behind a single lock.
//! - **Broadcast and targeted deliveries**: targets are resolved from the
//!   registry at the moment of delivery, never cached.
//! - **Ephemeral messages**: nothing is persisted. A subscriber that is offline
//!   when a notification arrives never sees it.
//! - **Per-connection isolation**: each send has its own timeout. A failed
//!   send is recorded in the outcome and evicts that connection only.
//!
//! # Message Flow
//!
//! 1. A subscriber opens `/sse`; the web layer verifies its identity
//! 2. [`Manager::register_connection`] opens a channel and registers the connection
//! 3. A producer posts to the ingress endpoint; the payload is normalized with
//!    [`notification::normalize`]
//! 4. [`Manager::broadcast`] or [`Manager::send_to_users`] resolves targets and
//!    pushes the wire format into each connection's channel
//! 5. The [`delivery::DeliveryEngine`] returns a [`outcome::DeliveryOutcome`]
//!    that the web layer reports back to the producer
//!
//! # Example: delivering to two subscribers
//!
//! ```rust,ignore
//! use sse::notification::{normalize, NotificationPayload};
//!
//! let notification = normalize(NotificationPayload {
//!     kind: "order".to_string(),
//!     message: "Your order shipped".to_string(),
//!     ..Default::default()
//! });
//! let targets = vec!["alice".to_string(), "bob".to_string()];
//! let outcome = app_state.relay.send_to_users(&notification, Some(targets.as_slice())).await?;
//! ```
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with dual-index architecture and type-safe ConnectionId
//! - `notification`: payload normalization and the immutable Notification record
//! - `delivery`: the DeliveryEngine (target resolution, isolation, eviction)
//! - `transport`: the injected per-connection send primitive
//! - `manager`: SSE transport, connection gateway and ConnectionGuard
//! - `message`: wire format sent to subscribers
//! - `outcome`, `error`: delivery reports and the error taxonomy

pub mod connection;
pub mod delivery;
pub mod error;
pub mod manager;
pub mod message;
pub mod notification;
pub mod outcome;
pub mod transport;

pub use manager::Manager;
