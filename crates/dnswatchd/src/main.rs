// # dnswatchd - DNS watcher daemon
//
// Thin integration layer: reads configuration from environment
// variables, wires the hickory resolver and a backend sink into the
// watcher, and handles signals. All watcher logic lives in
// dnswatch-core.
//
// ## Configuration
//
// - `DNSWATCH_SERVICE`: logical service name (default "default")
// - `DNSWATCH_SERVERS`: JSON array of server specs, e.g.
//   `[{"host":"api.internal","port":8080,"name":"api"}]` (required)
// - `DNSWATCH_CHECK_INTERVAL`: seconds between cycles (default 30)
// - `DNSWATCH_NAMESERVER`: alternate DNS server, "ip" or "ip:port"
// - `DNSWATCH_PUBLISH_ON_FAILURE`: publish an empty backend set when a
//   round fails ("true"/"false", default false)
// - `DNSWATCH_BACKENDS_FILE`: write the backend set as JSON to this
//   path on every publish; log-only when unset
// - `DNSWATCH_LOG_LEVEL`: trace|debug|info|warn|error (default info)

use anyhow::Result;
use async_trait::async_trait;
use dnswatch_core::{
    BackendDescriptor, BackendSink, DnsWatcher, DnsWatcherConfig, MetricsSink, ServerSpec,
};
use dnswatch_resolver_hickory::HickoryAddressResolver;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum WatcherExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WatcherExitCode> for ExitCode {
    fn from(code: WatcherExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration read from environment variables
struct Config {
    service: String,
    servers: Vec<ServerSpec>,
    check_interval: f64,
    nameserver: Option<String>,
    publish_on_failure: bool,
    backends_file: Option<PathBuf>,
    log_level: String,
}

impl Config {
    fn from_env() -> Result<Self> {
        let servers_json = env::var("DNSWATCH_SERVERS").map_err(|_| {
            anyhow::anyhow!(
                "DNSWATCH_SERVERS is required. \
                Set it via: export DNSWATCH_SERVERS='[{{\"host\":\"api.internal\",\"port\":8080,\"name\":\"api\"}}]'"
            )
        })?;
        let servers: Vec<ServerSpec> = serde_json::from_str(&servers_json)
            .map_err(|e| anyhow::anyhow!("DNSWATCH_SERVERS is not a valid server list: {e}"))?;

        Ok(Self {
            service: env::var("DNSWATCH_SERVICE").unwrap_or_else(|_| "default".to_string()),
            servers,
            check_interval: env::var("DNSWATCH_CHECK_INTERVAL")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("DNSWATCH_CHECK_INTERVAL is not a number: {e}"))?
                .unwrap_or(30.0),
            nameserver: env::var("DNSWATCH_NAMESERVER").ok(),
            publish_on_failure: env::var("DNSWATCH_PUBLISH_ON_FAILURE")
                .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            backends_file: env::var("DNSWATCH_BACKENDS_FILE").ok().map(PathBuf::from),
            log_level: env::var("DNSWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            anyhow::bail!("DNSWATCH_SERVERS must contain at least one server");
        }

        if !(self.check_interval.is_finite() && self.check_interval > 0.0) {
            anyhow::bail!(
                "DNSWATCH_CHECK_INTERVAL must be a positive number of seconds. Got: {}",
                self.check_interval
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "DNSWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        }

        Ok(())
    }

    fn watcher_config(&self) -> DnsWatcherConfig {
        let mut config = DnsWatcherConfig::new(self.service.clone(), self.servers.clone());
        config.check_interval = self.check_interval;
        config.nameserver = self.nameserver.clone();
        config.publish_on_failure = self.publish_on_failure;
        config
    }
}

/// Backend sink that logs every publish and optionally writes the
/// backend set as JSON to a file for external consumers.
struct FileBackendSink {
    path: Option<PathBuf>,
}

#[async_trait]
impl BackendSink for FileBackendSink {
    async fn set_backends(
        &self,
        backends: Vec<BackendDescriptor>,
        _generator_config: serde_json::Value,
    ) -> dnswatch_core::Result<()> {
        info!(backends = backends.len(), "backend set updated");

        if let Some(path) = &self.path {
            let rendered = serde_json::to_vec_pretty(&backends)?;
            tokio::fs::write(path, rendered).await?;
            debug!(path = %path.display(), "backend set written");
        }

        Ok(())
    }
}

/// Metrics sink that surfaces counters through the log stream.
struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn increment(&self, counter: &str, tags: &[(&str, &str)]) {
        info!(counter, ?tags, "metric incremented");
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WatcherExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return WatcherExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatcherExitCode::ConfigError.into();
    }

    info!("Starting dnswatchd");
    info!(
        service = %config.service,
        servers = config.servers.len(),
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WatcherExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            WatcherExitCode::RuntimeError
        } else {
            WatcherExitCode::CleanShutdown
        }
    })
    .into()
}

async fn run_daemon(config: Config) -> Result<()> {
    let resolver = Arc::new(HickoryAddressResolver::from_config(
        config.nameserver.as_deref(),
    )?);
    let sink = Arc::new(FileBackendSink {
        path: config.backends_file.clone(),
    });
    let metrics = Arc::new(LogMetrics);

    let (watcher, mut events) =
        DnsWatcher::new(config.watcher_config(), resolver, sink, metrics)?;

    // Surface watcher events in the log stream.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "watcher event");
        }
    });

    let handle = watcher.start();
    info!("Watcher started");

    let received = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", received);

    handle.shutdown();
    handle.join().await?;
    info!("Watcher stopped");

    Ok(())
}

/// Wait for SIGTERM or SIGINT.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(received)
}

/// Wait for CTRL-C (non-Unix fallback).
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
