// # Backend Sink Trait
//
// Defines the interface to the external backend-set consumer, the
// piece of the owning framework that turns a backend list into
// load-balancer configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One routable backend published downstream.
///
/// A server resolving to N addresses yields N descriptors; `port`,
/// `name` and `labels` are copied verbatim from the owning
/// [`ServerSpec`](crate::config::ServerSpec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// One resolved address
    pub host: String,

    /// Backend port
    pub port: u16,

    /// Backend identifier
    pub name: String,

    /// Opaque labels from the server spec
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Trait for the backend-set consumer.
///
/// The watcher calls this once at startup and thereafter only when the
/// resolved backend set actually changed. Publishing is assumed to be
/// a local state update on the consumer side; the watcher performs no
/// retries. The consumer handles its own internal synchronization.
#[async_trait]
pub trait BackendSink: Send + Sync {
    /// Replace the backend set with `backends`.
    ///
    /// `generator_config` is an opaque value forwarded from the
    /// watcher configuration; consumers that don't use it receive an
    /// empty JSON object.
    async fn set_backends(
        &self,
        backends: Vec<BackendDescriptor>,
        generator_config: serde_json::Value,
    ) -> Result<(), crate::Error>;
}
