//! Subscriber-facing event stream endpoint.
//!
//! Connection bookkeeping and delivery live in the `sse` crate; this module
//! only adapts them to an HTTP response.

pub mod handler;
