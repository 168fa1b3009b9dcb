//! Courier Metrics
//!
//! Metrics capture around the transport capability.
//!
//! # Architecture
//!
//! - [`MetricsSink`]: the boundary courier talks to, accepting named timers
//!   and counters with label sets (`operation`, `target`, `http_status`,
//!   `status_group`).
//! - [`MetricsRegistry`]: the in-process sink, with atomic series behind an
//!   `RwLock` map and serializable snapshots.
//! - [`MeteredTransport`]: the decorator, recording one latency sample per
//!   call attempt and one status counter per completed call while re-raising
//!   failures untouched.
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use courier_core::HttpTransport;
//! use courier_metrics::{MeteredTransport, MetricsRegistry};
//!
//! let registry = Arc::new(MetricsRegistry::new());
//! let transport = MeteredTransport::new(Arc::new(HttpTransport::new()), registry.clone());
//! // ... execute calls through `transport`, then scrape:
//! let snapshot = registry.snapshot();
//! ```

mod metered;
mod registry;
mod sink;
mod snapshot;

pub use metered::MeteredTransport;
pub use registry::MetricsRegistry;
pub use sink::{
    MetricsSink, CALL_TIMER, LABEL_HTTP_STATUS, LABEL_OPERATION, LABEL_STATUS_GROUP, LABEL_TARGET,
    STATUS_COUNTER,
};
pub use snapshot::{CounterSample, MetricsSnapshot, TimerSample};
