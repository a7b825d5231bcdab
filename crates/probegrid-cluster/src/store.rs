//! Production cluster-state provider.
//!
//! Subscribes to an external state store that pushes membership updates;
//! each update replaces the application's worker set in an in-memory
//! snapshot. Lookups never touch the network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use probe_core::HostPort;

use crate::proto;
use crate::proto::state_store_service_client::StateStoreServiceClient;
use crate::state::ClusterState;

/// Worker sets maintained from a state-store subscription stream.
pub struct StoreState {
    store_addr: HostPort,
    snapshot: Arc<RwLock<HashMap<String, Vec<HostPort>>>>,
}

impl StoreState {
    pub fn new(store_addr: HostPort) -> Self {
        Self {
            store_addr,
            snapshot: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace an application's worker set in the snapshot.
    pub async fn apply_update(&self, app: &str, backends: Vec<HostPort>) {
        self.snapshot.write().await.insert(app.to_string(), backends);
    }

    fn parse_backends(app: &str, addrs: &[String]) -> Vec<HostPort> {
        let mut backends = Vec::with_capacity(addrs.len());
        for addr in addrs {
            match addr.parse() {
                Ok(hp) => backends.push(hp),
                Err(e) => {
                    warn!(%app, %addr, error = %e, "dropping malformed worker address from update");
                }
            }
        }
        backends
    }
}

#[async_trait]
impl ClusterState for StoreState {
    async fn watch_application(&self, app: &str) -> bool {
        let endpoint = format!("http://{}", self.store_addr);
        let mut client = match StateStoreServiceClient::connect(endpoint).await {
            Ok(client) => client,
            Err(e) => {
                error!(%app, store = %self.store_addr, error = %e, "cannot reach state store");
                return false;
            }
        };

        let mut stream = match client
            .subscribe(proto::SubscribeRequest {
                app: app.to_string(),
            })
            .await
        {
            Ok(response) => response.into_inner(),
            Err(e) => {
                error!(%app, store = %self.store_addr, error = %e, "state store rejected subscription");
                return false;
            }
        };

        let snapshot = Arc::clone(&self.snapshot);
        let app = app.to_string();
        tokio::spawn(async move {
            loop {
                match stream.message().await {
                    Ok(Some(update)) => {
                        let backends = Self::parse_backends(&update.app, &update.backends);
                        snapshot.write().await.insert(update.app, backends);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(%app, error = %e, "state store stream error");
                        break;
                    }
                }
            }
            info!(%app, "state store subscription closed");
        });
        true
    }

    async fn backends(&self, app: &str) -> Vec<HostPort> {
        self.snapshot.read().await.get(app).cloned().unwrap_or_default()
    }
}
