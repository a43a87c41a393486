//! The DNS watcher: a cancellable background poll loop.
//!
//! ## Lifecycle
//!
//! 1. [`DnsWatcher::new`] validates the configuration (Initializing);
//!    violations fail here, before any task exists.
//! 2. [`DnsWatcher::start`] spawns the background task (Running): one
//!    immediate resolution round published unconditionally, then the
//!    repeating cycle resolve → compare → publish-if-changed → sleep
//!    to cadence → observe shutdown.
//! 3. On shutdown the task logs a clean exit and the handle's
//!    [`WatcherHandle::join`] resolves (Stopped). A stopped watcher
//!    cannot be restarted; build a new one.
//!
//! Every error inside one cycle is contained: logged at warn, counted
//! where applicable, and the loop proceeds to the next cycle. Only
//! configuration errors are fatal, and only before startup.
//!
//! ## Cancellation
//!
//! Cooperative, via a `tokio::sync::watch` channel owned by the
//! handle. The loop observes the flag once per cycle, after sleeping,
//! so shutdown latency is bounded by one full cycle (resolution time
//! plus sleep), never instantaneous.

use crate::config::{DnsWatcherConfig, ServerSpec};
use crate::error::{Error, Result};
use crate::resolution::{Resolution, resolve_servers};
use crate::traits::{AddressResolver, BackendSink, MetricsSink, RESOLVE_FAILED_COUNTER};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Fixed control hostname resolved by the liveness probe.
pub const PING_PROBE_HOST: &str = "example.com";

/// Capacity of the watcher event channel.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the watcher for external monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// The background task started
    Started {
        /// Number of configured servers
        servers: usize,
    },

    /// A backend set was handed to the sink
    BackendsPublished {
        /// Number of flattened backends
        backends: usize,
    },

    /// A resolution round failed as a whole
    RoundFailed {
        /// Rendered failure cause
        error: String,
    },

    /// The background task exited
    Stopped,
}

/// Background watcher keeping a backend set in sync with DNS.
pub struct DnsWatcher {
    config: DnsWatcherConfig,
    resolver: Arc<dyn AddressResolver>,
    sink: Arc<dyn BackendSink>,
    metrics: Arc<dyn MetricsSink>,
    event_tx: mpsc::Sender<WatcherEvent>,
}

impl DnsWatcher {
    /// Create a watcher, validating the configuration.
    ///
    /// Returns the watcher plus a receiver of [`WatcherEvent`]s.
    /// Configuration violations are returned synchronously; no
    /// background task exists yet.
    pub fn new(
        config: DnsWatcherConfig,
        resolver: Arc<dyn AddressResolver>,
        sink: Arc<dyn BackendSink>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<(Self, mpsc::Receiver<WatcherEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let watcher = Self {
            config,
            resolver,
            sink,
            metrics,
            event_tx,
        };

        Ok((watcher, event_rx))
    }

    /// Read-only view of the configured server list.
    pub fn discovery_servers(&self) -> &[ServerSpec] {
        &self.config.servers
    }

    /// Spawn the background task and return its handle.
    pub fn start(self) -> WatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let alive = Arc::new(AtomicBool::new(true));

        let resolver = Arc::clone(&self.resolver);
        let servers = self.config.servers.clone();

        let task_alive = Arc::clone(&alive);
        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
            task_alive.store(false, Ordering::SeqCst);
        });

        WatcherHandle {
            join,
            alive,
            shutdown_tx,
            resolver,
            servers,
        }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let interval = Duration::from_secs_f64(self.config.check_interval);

        info!(
            service = %self.config.name,
            servers = self.config.servers.len(),
            interval_secs = self.config.check_interval,
            "dns watcher started"
        );
        self.emit(WatcherEvent::Started {
            servers: self.config.servers.len(),
        });

        // Initial round: the first resolution always counts as changed.
        let mut last = match resolve_servers(&*self.resolver, &self.config.servers).await {
            Ok(resolution) => {
                if let Err(error) = self.publish(&resolution).await {
                    warn!(error = %error, "initial backend publish failed");
                }
                resolution
            }
            Err(error) => {
                self.note_round_failure(&error);
                Resolution::empty()
            }
        };

        loop {
            let cycle_start = Instant::now();

            if let Err(error) = self.cycle(&mut last).await {
                warn!(error = %error, "error in dns watcher cycle");
            }

            // Sleep to cadence; a round slower than the interval rolls
            // straight into the next cycle.
            let elapsed = cycle_start.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }

            if *shutdown_rx.borrow_and_update() {
                break;
            }
        }

        info!(service = %self.config.name, "dns watcher exited cleanly");
        self.emit(WatcherEvent::Stopped);
    }

    /// One poll cycle: resolve, compare, publish if changed.
    async fn cycle(&self, last: &mut Resolution) -> Result<()> {
        match resolve_servers(&*self.resolver, &self.config.servers).await {
            Ok(current) => {
                if current != *last {
                    self.publish(&current).await?;
                    *last = current;
                }
            }
            Err(error) => {
                self.note_round_failure(&error);
                // The previously accepted resolution stays authoritative
                // unless the configuration opts into degrade-to-empty.
                if self.config.publish_on_failure {
                    let current = Resolution::empty();
                    if current != *last {
                        self.publish(&current).await?;
                        *last = current;
                    }
                }
            }
        }

        Ok(())
    }

    async fn publish(&self, resolution: &Resolution) -> Result<()> {
        let backends = resolution.backends();
        let count = backends.len();
        debug!(service = %self.config.name, backends = count, "publishing backend set");

        self.sink
            .set_backends(backends, self.config.generator_config.clone())
            .await?;

        self.emit(WatcherEvent::BackendsPublished { backends: count });
        Ok(())
    }

    fn note_round_failure(&self, error: &Error) {
        self.metrics.increment(
            RESOLVE_FAILED_COUNTER,
            &[("service", self.config.name.as_str())],
        );
        warn!(
            service = %self.config.name,
            error = %error,
            "dns resolve error while resolving host names"
        );
        self.emit(WatcherEvent::RoundFailed {
            error: error.to_string(),
        });
    }

    fn emit(&self, event: WatcherEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("watcher event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Handle to a running watcher task.
///
/// The handle owns the shutdown signal and the join handle; the
/// watcher itself lives inside the spawned task. The liveness probe
/// performs its own resolver call and never touches loop state, so it
/// is safe to call concurrently with the poll loop.
pub struct WatcherHandle {
    join: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    resolver: Arc<dyn AddressResolver>,
    servers: Vec<ServerSpec>,
}

impl WatcherHandle {
    /// True while the background task is running.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Request shutdown.
    ///
    /// The loop observes the signal once per cycle, after sleeping;
    /// the task exits within one full cycle. Safe to call repeatedly.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the background task to exit.
    pub async fn join(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| Error::other(format!("watcher task failed: {e}")))
    }

    /// Liveness probe.
    ///
    /// True iff the background task is alive and an immediate
    /// resolution of [`PING_PROBE_HOST`] returns a non-empty address
    /// set. Independent of the poll cycle and its cached state.
    pub async fn ping(&self) -> bool {
        if !self.is_alive() {
            return false;
        }

        match self.resolver.resolve(PING_PROBE_HOST).await {
            Ok(addresses) => !addresses.is_empty(),
            Err(_) => false,
        }
    }

    /// Read-only view of the configured server list.
    pub fn discovery_servers(&self) -> &[ServerSpec] {
        &self.servers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{BackendDescriptor, NoopMetrics};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::IpAddr;

    struct NullResolver;

    #[async_trait]
    impl AddressResolver for NullResolver {
        async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>> {
            Ok(Vec::new())
        }
    }

    struct NullSink;

    #[async_trait]
    impl BackendSink for NullSink {
        async fn set_backends(
            &self,
            _backends: Vec<BackendDescriptor>,
            _generator_config: serde_json::Value,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn construction_rejects_invalid_method() {
        let mut config = DnsWatcherConfig::new(
            "svc",
            vec![ServerSpec {
                host: "example.internal".to_string(),
                port: 80,
                name: "be".to_string(),
                labels: HashMap::new(),
            }],
        );
        config.method = "zookeeper".to_string();

        let result = DnsWatcher::new(
            config,
            Arc::new(NullResolver),
            Arc::new(NullSink),
            Arc::new(NoopMetrics),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn construction_rejects_empty_servers() {
        let config = DnsWatcherConfig::new("svc", Vec::new());
        let result = DnsWatcher::new(
            config,
            Arc::new(NullResolver),
            Arc::new(NullSink),
            Arc::new(NoopMetrics),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn discovery_servers_exposes_configured_list() {
        let spec = ServerSpec {
            host: "example.internal".to_string(),
            port: 80,
            name: "be".to_string(),
            labels: HashMap::new(),
        };
        let config = DnsWatcherConfig::new("svc", vec![spec.clone()]);
        let (watcher, _events) = DnsWatcher::new(
            config,
            Arc::new(NullResolver),
            Arc::new(NullSink),
            Arc::new(NoopMetrics),
        )
        .unwrap();
        assert_eq!(watcher.discovery_servers(), &[spec]);
    }
}
