use std::time::Duration;

/// Timer metric: call latency per operation/target.
pub const CALL_TIMER: &str = "client.calls";

/// Counter metric: completed calls per operation/target/status.
pub const STATUS_COUNTER: &str = "client.http_response_code";

/// Label key for the invoked operation identity.
pub const LABEL_OPERATION: &str = "operation";
/// Label key for the logical target/service name.
pub const LABEL_TARGET: &str = "target";
/// Label key for the numeric HTTP status code.
pub const LABEL_HTTP_STATUS: &str = "http_status";
/// Label key for the status class, e.g. "2xx".
pub const LABEL_STATUS_GROUP: &str = "status_group";

/// Destination for named timers and counters with label sets.
///
/// Implementations must be safe to share across concurrent calls; courier
/// only promises consistent label keys. [`MetricsRegistry`](crate::MetricsRegistry)
/// is the in-process implementation.
pub trait MetricsSink: Send + Sync {
    fn record_timer(&self, name: &str, labels: &[(&str, &str)], duration: Duration);

    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]);
}
