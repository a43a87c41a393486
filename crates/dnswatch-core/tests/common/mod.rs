//! Test doubles and common utilities for watcher contract tests.

use async_trait::async_trait;
use dnswatch_core::traits::{AddressResolver, BackendDescriptor, BackendSink, MetricsSink};
use dnswatch_core::{DnsWatcherConfig, Error, Result, ServerSpec};
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

type ScriptedResponse = std::result::Result<Vec<IpAddr>, String>;

/// A resolver that replays a per-call script of responses.
///
/// Each `resolve()` call pops the next scripted response; once the
/// script runs dry the last response repeats. Per-host overrides (for
/// the liveness probe host) are checked first and never consume the
/// script. Call counts and call timestamps are recorded for cadence
/// assertions.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    fallback: Arc<Mutex<Option<ScriptedResponse>>>,
    host_overrides: Arc<Mutex<HashMap<String, ScriptedResponse>>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    call_times: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate resolution latency on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Script a successful response for the next call.
    pub fn push_ok(&self, addresses: &[&str]) {
        let parsed = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.script.lock().unwrap().push_back(Ok(parsed));
    }

    /// Script a failure for the next call.
    pub fn push_err(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Fixed successful response for one host, bypassing the script.
    pub fn set_host_ok(&self, host: &str, addresses: &[&str]) {
        let parsed = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.host_overrides
            .lock()
            .unwrap()
            .insert(host.to_string(), Ok(parsed));
    }

    /// Fixed failure for one host, bypassing the script.
    pub fn set_host_err(&self, host: &str, message: &str) {
        self.host_overrides
            .lock()
            .unwrap()
            .insert(host.to_string(), Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    fn next_response(&self, host: &str) -> ScriptedResponse {
        if let Some(response) = self.host_overrides.lock().unwrap().get(host) {
            return response.clone();
        }

        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(response) => {
                *self.fallback.lock().unwrap() = Some(response.clone());
                response
            }
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Ok(Vec::new())),
        }
    }
}

#[async_trait]
impl AddressResolver for ScriptedResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.next_response(host)
            .map_err(|message| Error::resolve(host, message))
    }
}

/// A backend sink that records every published backend set.
#[derive(Clone, Default)]
pub struct RecordingSink {
    published: Arc<Mutex<Vec<Vec<BackendDescriptor>>>>,
    generator_configs: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn published(&self) -> Vec<Vec<BackendDescriptor>> {
        self.published.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Vec<BackendDescriptor>> {
        self.published.lock().unwrap().last().cloned()
    }

    pub fn generator_configs(&self) -> Vec<serde_json::Value> {
        self.generator_configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendSink for RecordingSink {
    async fn set_backends(
        &self,
        backends: Vec<BackendDescriptor>,
        generator_config: serde_json::Value,
    ) -> Result<()> {
        self.published.lock().unwrap().push(backends);
        self.generator_configs.lock().unwrap().push(generator_config);
        Ok(())
    }
}

/// A metrics sink that counts increments per counter name.
#[derive(Clone, Default)]
pub struct CountingMetrics {
    counts: Arc<Mutex<HashMap<String, u64>>>,
    last_tags: Arc<Mutex<Option<Vec<(String, String)>>>>,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, counter: &str) -> u64 {
        self.counts
            .lock()
            .unwrap()
            .get(counter)
            .copied()
            .unwrap_or(0)
    }

    pub fn last_tags(&self) -> Option<Vec<(String, String)>> {
        self.last_tags.lock().unwrap().clone()
    }
}

impl MetricsSink for CountingMetrics {
    fn increment(&self, counter: &str, tags: &[(&str, &str)]) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(counter.to_string())
            .or_insert(0) += 1;
        *self.last_tags.lock().unwrap() = Some(
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }
}

/// One server spec with empty labels.
pub fn server_spec(host: &str, port: u16, name: &str) -> ServerSpec {
    ServerSpec {
        host: host.to_string(),
        port,
        name: name.to_string(),
        labels: HashMap::new(),
    }
}

/// A valid watcher configuration with the given servers and interval.
pub fn watcher_config(servers: Vec<ServerSpec>, check_interval: f64) -> DnsWatcherConfig {
    let mut config = DnsWatcherConfig::new("svc", servers);
    config.check_interval = check_interval;
    config
}
