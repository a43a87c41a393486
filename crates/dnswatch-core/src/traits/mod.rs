//! Trait seams between the watcher and its collaborators.
//!
//! - [`AddressResolver`]: DNS lookup capability
//! - [`BackendSink`]: the external backend-set consumer
//! - [`MetricsSink`]: counter sink for failure accounting

pub mod backend_sink;
pub mod metrics;
pub mod resolver;

pub use backend_sink::{BackendDescriptor, BackendSink};
pub use metrics::{MetricsSink, NoopMetrics, RESOLVE_FAILED_COUNTER};
pub use resolver::AddressResolver;
