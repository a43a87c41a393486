//! Configuration types for the DNS watcher.
//!
//! A watcher is configured once at construction from the discovery
//! section handed down by the owning framework and never reconfigured
//! in place.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Discovery method identifier this watcher accepts.
pub const DISCOVERY_METHOD: &str = "dns";

/// One configured host to monitor.
///
/// `host` may be a hostname or an IP literal; literals are published
/// as-is without a DNS lookup. `labels` is an opaque passthrough for
/// the downstream backend consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Hostname or IP literal
    pub host: String,

    /// Backend port
    pub port: u16,

    /// Backend identifier
    pub name: String,

    /// Opaque labels copied onto every published backend
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsWatcherConfig {
    /// Discovery method; must equal [`DISCOVERY_METHOD`]
    pub method: String,

    /// Logical service name, used to tag the resolve-failure metric
    pub name: String,

    /// Ordered, non-empty list of hosts to monitor
    pub servers: Vec<ServerSpec>,

    /// Seconds between cycle starts
    #[serde(default = "default_check_interval")]
    pub check_interval: f64,

    /// Optional alternate DNS server ("ip" or "ip:port"); system
    /// resolver configuration is used when absent
    #[serde(default)]
    pub nameserver: Option<String>,

    /// Publish an empty backend set when a resolution round fails.
    ///
    /// Off by default: a transient DNS failure keeps the previously
    /// accepted backends instead of draining traffic to zero. Turning
    /// this on restores the degrade-to-empty behavior.
    #[serde(default)]
    pub publish_on_failure: bool,

    /// Opaque generator configuration forwarded on every publish
    #[serde(default = "default_generator_config")]
    pub generator_config: serde_json::Value,
}

fn default_check_interval() -> f64 {
    30.0
}

fn default_generator_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl DnsWatcherConfig {
    /// Create a configuration with defaults for the optional fields
    pub fn new(name: impl Into<String>, servers: Vec<ServerSpec>) -> Self {
        Self {
            method: DISCOVERY_METHOD.to_string(),
            name: name.into(),
            servers,
            check_interval: default_check_interval(),
            nameserver: None,
            publish_on_failure: false,
            generator_config: default_generator_config(),
        }
    }

    /// Validate the configuration
    ///
    /// Violations are fatal and reported before any background task
    /// starts; the watcher never runs with an invalid configuration.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.method != DISCOVERY_METHOD {
            return Err(crate::Error::config(format!(
                "invalid discovery method '{}', expected '{}'",
                self.method, DISCOVERY_METHOD
            )));
        }

        if self.servers.is_empty() {
            return Err(crate::Error::config(
                "a non-empty list of servers is required",
            ));
        }

        if !(self.check_interval.is_finite() && self.check_interval > 0.0) {
            return Err(crate::Error::config(format!(
                "check_interval must be a positive number of seconds, got {}",
                self.check_interval
            )));
        }

        Ok(())
    }
}
