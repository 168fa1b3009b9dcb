//! Courier Load Balancing
//!
//! Server-list management and the load-balanced transport decorator.
//!
//! [`ServerList`] holds the candidate endpoints for a logical client. It is
//! shared across concurrent calls and externally updatable, so a
//! configuration refresh is observed by the very next call.
//! [`LoadBalancedTransport`] wraps any transport and resolves one endpoint
//! per call through a pluggable [`SelectPolicy`] (round-robin by default).

mod server_list;
mod transport;

pub use server_list::{RoundRobin, SelectPolicy, ServerList};
pub use transport::LoadBalancedTransport;
