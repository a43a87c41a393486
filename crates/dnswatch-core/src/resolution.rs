//! Resolution rounds and backend flattening.
//!
//! One round maps every configured [`ServerSpec`] to its sorted
//! address set, in configuration order. The resulting [`Resolution`]
//! is the unit of comparison between cycles and the unit cached as
//! last known good state.

use crate::config::ServerSpec;
use crate::error::Result;
use crate::traits::{AddressResolver, BackendDescriptor};
use std::net::IpAddr;

/// One server's resolved addresses within a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServer {
    /// The configured server
    pub spec: ServerSpec,

    /// Resolved address strings, sorted lexicographically
    pub addresses: Vec<String>,
}

/// The full outcome of one resolution round.
///
/// Entries keep the configured server order (never sorted), so two
/// rounds compare stably even when addresses change. Equality is
/// element-wise over (server, sorted addresses) pairs, which is
/// exactly the watcher's change detection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    entries: Vec<ResolvedServer>,
}

impl Resolution {
    /// The empty resolution (zero servers).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolved entries in configuration order.
    pub fn entries(&self) -> &[ResolvedServer] {
        &self.entries
    }

    /// True when the round carries no servers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into one backend per (server, address) pair.
    pub fn backends(&self) -> Vec<BackendDescriptor> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry.addresses.iter().map(|address| BackendDescriptor {
                    host: address.clone(),
                    port: entry.spec.port,
                    name: entry.spec.name.clone(),
                    labels: entry.spec.labels.clone(),
                })
            })
            .collect()
    }
}

/// Resolve one server to its sorted address set.
///
/// A `host` that is already an IPv4 or IPv6 literal short-circuits to
/// itself without a DNS call; literals must be exempt from resolution
/// failures. Resolver errors propagate to the caller.
pub async fn resolve_server(
    resolver: &dyn AddressResolver,
    spec: &ServerSpec,
) -> Result<Vec<String>> {
    if spec.host.parse::<IpAddr>().is_ok() {
        return Ok(vec![spec.host.clone()]);
    }

    let mut addresses: Vec<String> = resolver
        .resolve(&spec.host)
        .await?
        .iter()
        .map(IpAddr::to_string)
        .collect();
    addresses.sort();
    Ok(addresses)
}

/// Perform one resolution round over the full server list.
///
/// Servers are resolved one at a time, in order. The first lookup
/// failure aborts the whole round with an error; partial per-server
/// success is deliberately not modeled, because a half-resolved
/// backend set could route traffic incorrectly. The scheduler decides
/// what a failed round means.
pub async fn resolve_servers(
    resolver: &dyn AddressResolver,
    servers: &[ServerSpec],
) -> Result<Resolution> {
    let mut entries = Vec::with_capacity(servers.len());
    for spec in servers {
        let addresses = resolve_server(resolver, spec).await?;
        entries.push(ResolvedServer {
            spec: spec.clone(),
            addresses,
        });
    }
    Ok(Resolution { entries })
}
