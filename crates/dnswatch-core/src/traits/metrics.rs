// # Metrics Sink Trait
//
// Counter sink for the watcher's failure accounting. The owning
// framework plugs in its own statsd/prometheus bridge; tests plug in
// a counting double.

/// Counter incremented once per failed resolution round.
pub const RESOLVE_FAILED_COUNTER: &str = "watcher.dns.resolve_failed";

/// Trait for metrics sinks.
///
/// Increments must be cheap and non-blocking; the watcher calls this
/// from inside its poll loop.
pub trait MetricsSink: Send + Sync {
    /// Increment `counter` by one with the given tag pairs.
    fn increment(&self, counter: &str, tags: &[(&str, &str)]);
}

/// A metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _counter: &str, _tags: &[(&str, &str)]) {}
}
