use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::sink::MetricsSink;
use crate::snapshot::{CounterSample, MetricsSnapshot, TimerSample};

/// Identity of one metric series: name plus its sorted label set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    name: String,
    labels: Vec<(String, String)>,
}

impl SeriesKey {
    fn new(name: &str, labels: &[(&str, &str)]) -> Self {
        let mut labels: Vec<(String, String)> = labels
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        // Sorted so label order at the call site never splits a series.
        labels.sort();
        Self {
            name: name.to_string(),
            labels,
        }
    }
}

#[derive(Debug, Default)]
struct TimerStats {
    count: AtomicU64,
    total_us: AtomicU64,
    max_us: AtomicU64,
}

impl TimerStats {
    /// Relaxed ordering throughout: each counter is independent and snapshots
    /// are only eventually consistent.
    fn record(&self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_us.fetch_add(micros, Ordering::Relaxed);
        self.max_us.fetch_max(micros, Ordering::Relaxed);
    }

    fn sample(&self, key: &SeriesKey) -> TimerSample {
        let count = self.count.load(Ordering::Relaxed);
        let total_us = self.total_us.load(Ordering::Relaxed);
        TimerSample {
            name: key.name.clone(),
            labels: key.labels.clone(),
            count,
            total_us,
            mean_us: if count == 0 { 0 } else { total_us / count },
            max_us: self.max_us.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe, in-process metrics storage.
///
/// The hot path (incrementing a known series) is an atomic operation; the
/// series maps are behind `RwLock` only for series creation and snapshots.
/// Series cardinality is bounded by operations x targets x status codes, so
/// entries are never evicted.
///
/// # Example
///
/// ```rust
/// use courier_metrics::{MetricsRegistry, MetricsSink};
///
/// let registry = MetricsRegistry::new();
/// registry.increment_counter("client.http_response_code", &[("http_status", "200")]);
/// assert_eq!(
///     registry.counter_value("client.http_response_code", &[("http_status", "200")]),
///     1
/// );
/// ```
#[derive(Debug)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<SeriesKey, Arc<AtomicU64>>>,
    timers: RwLock<HashMap<SeriesKey, Arc<TimerStats>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            timers: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Current value of a counter series, 0 when the series does not exist.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        let key = SeriesKey::new(name, labels);
        self.counters
            .read()
            .unwrap()
            .get(&key)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Number of samples recorded for a timer series, 0 when absent.
    pub fn timer_count(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        let key = SeriesKey::new(name, labels);
        self.timers
            .read()
            .unwrap()
            .get(&key)
            .map(|stats| stats.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Point-in-time view of every series, sorted for stable output.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut counters: Vec<CounterSample> = {
            let guard = self.counters.read().unwrap();
            guard
                .iter()
                .map(|(key, counter)| CounterSample {
                    name: key.name.clone(),
                    labels: key.labels.clone(),
                    value: counter.load(Ordering::Relaxed),
                })
                .collect()
        };
        counters.sort_by(|a, b| (&a.name, &a.labels).cmp(&(&b.name, &b.labels)));

        let mut timers: Vec<TimerSample> = {
            let guard = self.timers.read().unwrap();
            guard.iter().map(|(key, stats)| stats.sample(key)).collect()
        };
        timers.sort_by(|a, b| (&a.name, &a.labels).cmp(&(&b.name, &b.labels)));

        MetricsSnapshot {
            uptime_ms: self.uptime_ms(),
            counters,
            timers,
        }
    }

    fn counter(&self, key: SeriesKey) -> Arc<AtomicU64> {
        if let Some(counter) = self.counters.read().unwrap().get(&key) {
            return counter.clone();
        }
        let mut counters = self.counters.write().unwrap();
        counters.entry(key).or_default().clone()
    }

    fn timer(&self, key: SeriesKey) -> Arc<TimerStats> {
        if let Some(stats) = self.timers.read().unwrap().get(&key) {
            return stats.clone();
        }
        let mut timers = self.timers.write().unwrap();
        timers.entry(key).or_default().clone()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for MetricsRegistry {
    fn record_timer(&self, name: &str, labels: &[(&str, &str)], duration: Duration) {
        self.timer(SeriesKey::new(name, labels)).record(duration);
    }

    fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        self.counter(SeriesKey::new(name, labels))
            .fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counter_increments() {
        let registry = MetricsRegistry::new();
        let labels = [("operation", "Api#get"), ("target", "api")];

        registry.increment_counter("calls", &labels);
        registry.increment_counter("calls", &labels);

        assert_eq!(registry.counter_value("calls", &labels), 2);
    }

    #[test]
    fn test_missing_series_reads_zero() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.counter_value("calls", &[]), 0);
        assert_eq!(registry.timer_count("latency", &[]), 0);
    }

    #[test]
    fn test_distinct_label_sets_are_distinct_series() {
        let registry = MetricsRegistry::new();
        registry.increment_counter("calls", &[("http_status", "200")]);
        registry.increment_counter("calls", &[("http_status", "503")]);

        assert_eq!(registry.counter_value("calls", &[("http_status", "200")]), 1);
        assert_eq!(registry.counter_value("calls", &[("http_status", "503")]), 1);
    }

    #[test]
    fn test_label_order_does_not_split_series() {
        let registry = MetricsRegistry::new();
        registry.increment_counter("calls", &[("a", "1"), ("b", "2")]);
        registry.increment_counter("calls", &[("b", "2"), ("a", "1")]);

        assert_eq!(registry.counter_value("calls", &[("a", "1"), ("b", "2")]), 2);
    }

    #[test]
    fn test_timer_statistics() {
        let registry = MetricsRegistry::new();
        let labels = [("operation", "Api#get")];

        registry.record_timer("latency", &labels, Duration::from_micros(100));
        registry.record_timer("latency", &labels, Duration::from_micros(300));

        assert_eq!(registry.timer_count("latency", &labels), 2);
        let snapshot = registry.snapshot();
        let sample = snapshot
            .timers
            .iter()
            .find(|t| t.name == "latency")
            .unwrap();
        assert_eq!(sample.count, 2);
        assert_eq!(sample.total_us, 400);
        assert_eq!(sample.mean_us, 200);
        assert_eq!(sample.max_us, 300);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let registry = MetricsRegistry::new();
        registry.increment_counter("z", &[]);
        registry.increment_counter("a", &[]);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.counters[0].name, "a");
        assert_eq!(snapshot.counters[1].name, "z");
    }

    #[test]
    fn test_thread_safety() {
        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    registry.increment_counter("calls", &[("operation", "concurrent")]);
                    registry.record_timer(
                        "latency",
                        &[("operation", "concurrent")],
                        Duration::from_micros(10),
                    );
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            registry.counter_value("calls", &[("operation", "concurrent")]),
            10_000
        );
        assert_eq!(
            registry.timer_count("latency", &[("operation", "concurrent")]),
            10_000
        );
    }
}
