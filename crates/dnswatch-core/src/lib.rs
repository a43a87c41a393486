// # dnswatch-core
//
// Core library for the DNS backend watcher: one pluggable discovery
// strategy that keeps a load-balancer backend set synchronized with
// the DNS resolution of a configured host list.
//
// ## Architecture Overview
//
// - **AddressResolver**: trait for DNS lookups (hickory-backed
//   implementation lives in `dnswatch-resolver-hickory`)
// - **Resolution**: one round of (server, sorted addresses) pairs;
//   structural equality is the change detector
// - **BackendSink**: trait for the external backend-set consumer
// - **MetricsSink**: counter seam for failure accounting
// - **DnsWatcher / WatcherHandle**: the cancellable background poll
//   loop and its shutdown/join/liveness surface
//
// ## Data flow
//
// ```text
// DnsWatcher ──▶ resolve_servers ──▶ AddressResolver
//      │                                   (per server, in order)
//      ▼
// Resolution == last?  ── no ──▶ Resolution::backends()
//      │                              │
//     yes                             ▼
//      │                      BackendSink::set_backends
//      ▼
//   sleep to cadence, observe shutdown
// ```

pub mod config;
pub mod error;
pub mod resolution;
pub mod traits;
pub mod watcher;

// Re-export core types for convenience
pub use config::{DISCOVERY_METHOD, DnsWatcherConfig, ServerSpec};
pub use error::{Error, Result};
pub use resolution::{Resolution, ResolvedServer, resolve_server, resolve_servers};
pub use traits::{
    AddressResolver, BackendDescriptor, BackendSink, MetricsSink, NoopMetrics,
    RESOLVE_FAILED_COUNTER,
};
pub use watcher::{DnsWatcher, PING_PROBE_HOST, WatcherEvent, WatcherHandle};
