//! Cluster-state providers — who are the workers for an application?
//!
//! A scheduler consults its provider once per submission and treats the
//! returned set as a snapshot: membership changes between the submission
//! and later task pulls do not invalidate a plan already computed.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use probe_core::{HostPort, HostPortParseError};

/// Source of the worker set for each application.
#[async_trait]
pub trait ClusterState: Send + Sync {
    /// Start tracking an application. Returns whether the provider accepted
    /// the watch.
    async fn watch_application(&self, app: &str) -> bool;

    /// Snapshot of the application's worker addresses.
    async fn backends(&self, app: &str) -> Vec<HostPort>;
}

// ── Standalone ─────────────────────────────────────────────────────

/// In-memory provider for single-host deployments. Workers on the same
/// machine register themselves directly with the scheduler.
#[derive(Default)]
pub struct StandaloneState {
    backends: DashMap<String, BTreeSet<HostPort>>,
}

impl StandaloneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worker to an application's set. Returns false if it was
    /// already registered.
    pub fn register_backend(&self, app: &str, addr: HostPort) -> bool {
        let added = self.backends.entry(app.to_string()).or_default().insert(addr.clone());
        if added {
            info!(%app, worker = %addr, "backend registered");
        } else {
            debug!(%app, worker = %addr, "backend already registered");
        }
        added
    }

    /// Remove a worker from an application's set. Returns whether it was
    /// present.
    pub fn deregister_backend(&self, app: &str, addr: &HostPort) -> bool {
        let removed = self
            .backends
            .get_mut(app)
            .map(|mut set| set.remove(addr))
            .unwrap_or(false);
        if removed {
            info!(%app, worker = %addr, "backend deregistered");
        }
        removed
    }
}

#[async_trait]
impl ClusterState for StandaloneState {
    async fn watch_application(&self, app: &str) -> bool {
        self.backends.entry(app.to_string()).or_default();
        true
    }

    async fn backends(&self, app: &str) -> Vec<HostPort> {
        self.backends
            .get(app)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// ── Config-based ───────────────────────────────────────────────────

/// Static provider: one fixed worker list from configuration, served for
/// every watched application.
pub struct ConfigState {
    workers: Vec<HostPort>,
}

impl ConfigState {
    /// Parse the configured worker addresses. Any malformed entry is fatal.
    pub fn from_workers(addrs: &[String]) -> Result<Self, HostPortParseError> {
        let workers = addrs
            .iter()
            .map(|a| a.parse())
            .collect::<Result<Vec<HostPort>, _>>()?;
        Ok(Self { workers })
    }
}

#[async_trait]
impl ClusterState for ConfigState {
    async fn watch_application(&self, app: &str) -> bool {
        debug!(%app, workers = self.workers.len(), "watching application against static worker list");
        true
    }

    async fn backends(&self, _app: &str) -> Vec<HostPort> {
        self.workers.clone()
    }
}
