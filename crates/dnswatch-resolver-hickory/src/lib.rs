// # Hickory Address Resolver
//
// `AddressResolver` implementation backed by `hickory_resolver`'s
// `TokioResolver`.
//
// ## Configuration
//
// - System mode: resolver built from the host's configuration
//   (`/etc/resolv.conf` and friends)
// - Nameserver mode: all lookups go to one explicitly configured
//   server, `"ip"` or `"ip:port"` (UDP/TCP clear-text, port 53 when
//   omitted)
//
// The client-side lookup cache is disabled in both modes so that every
// polling round observes fresh records instead of replaying cached
// answers for a TTL.

use async_trait::async_trait;
use dnswatch_core::{AddressResolver, Error, Result};
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

/// DNS resolver for watcher lookups.
pub struct HickoryAddressResolver {
    inner: TokioResolver,
}

impl HickoryAddressResolver {
    /// Build from the system resolver configuration.
    pub fn from_system_config() -> Result<Self> {
        let mut builder = TokioResolver::builder_tokio()
            .map_err(|e| Error::other(format!("failed to read system resolver config: {e}")))?;
        builder.options_mut().cache_size = 0;
        Ok(Self {
            inner: builder.build(),
        })
    }

    /// Build against one explicit nameserver.
    pub fn with_nameserver(nameserver: SocketAddr) -> Self {
        let group =
            NameServerConfigGroup::from_ips_clear(&[nameserver.ip()], nameserver.port(), true);
        let config = ResolverConfig::from_parts(None, Vec::new(), group);

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().cache_size = 0;
        Self {
            inner: builder.build(),
        }
    }

    /// Build from the watcher's optional `nameserver` setting.
    pub fn from_config(nameserver: Option<&str>) -> Result<Self> {
        match nameserver {
            None => Self::from_system_config(),
            Some(address) => Ok(Self::with_nameserver(parse_nameserver(address)?)),
        }
    }
}

#[async_trait]
impl AddressResolver for HickoryAddressResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        let lookup = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| Error::resolve(host, e.to_string()))?;

        let addresses: Vec<IpAddr> = lookup.iter().collect();
        debug!(host, count = addresses.len(), "resolved addresses");
        Ok(addresses)
    }
}

/// Parse `"ip"` or `"ip:port"` into a socket address, port 53 default.
fn parse_nameserver(address: &str) -> Result<SocketAddr> {
    if let Ok(socket) = address.parse::<SocketAddr>() {
        return Ok(socket);
    }
    address
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| Error::config(format!("invalid nameserver address '{address}'")))
}
