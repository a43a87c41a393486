// # Address Resolver Trait
//
// Defines the DNS lookup capability the watcher depends on.
//
// ## Implementations
//
// - Hickory-based: `dnswatch-resolver-hickory` crate
// - Test doubles: scripted resolvers in the contract tests

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for DNS lookup implementations.
///
/// Implementations must be thread-safe: the watcher's poll loop and
/// the liveness probe may resolve concurrently from different tasks.
///
/// A failed lookup (timeout, NXDOMAIN, network error) is surfaced as
/// an error, never swallowed; the watcher decides what a failure
/// means for the round. Timeout policy is owned by the implementation.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve a hostname to its current set of addresses.
    ///
    /// Both IPv4 and IPv6 results must be supported. An empty result
    /// with no error is a valid outcome (the name exists but has no
    /// address records).
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, crate::Error>;
}
