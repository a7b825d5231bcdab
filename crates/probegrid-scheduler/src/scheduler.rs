//! Scheduler façade — submit, pull, and completion routing.
//!
//! `submit_job` is a best-effort broadcast: once a request ID is allocated,
//! nothing aborts the submission. A worker that never received its batch
//! simply never pulls; correctness of the final assignment depends only on
//! which workers eventually pull, not on how many accepted the dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, error};

use probe_core::config::PlacementConfig;
use probe_core::{FullTaskId, HostPort, LaunchSpec, ReservationBatch, SchedulingRequest};
use probegrid_cluster::proto;
use probegrid_cluster::proto::frontend_service_client::FrontendServiceClient;
use probegrid_cluster::proto::node_monitor_service_client::NodeMonitorServiceClient;
use probegrid_cluster::{ChannelPool, ClusterState};
use probegrid_placement::{ConstrainedPlacer, TaskPlacer, UnconstrainedPlacer};

use crate::audit;
use crate::error::{SchedulerError, SchedulerResult};
use crate::id::RequestIdAllocator;
use crate::registry::RequestRegistry;

pub struct Scheduler {
    /// Address peers use to reach this scheduler; embedded in every batch.
    address: HostPort,
    cluster: Arc<dyn ClusterState>,
    worker_pool: Arc<ChannelPool>,
    frontend_pool: Arc<ChannelPool>,
    /// Application → frontend message endpoint. Written on registration,
    /// read on every completion message.
    frontends: RwLock<HashMap<String, HostPort>>,
    registry: RequestRegistry,
    ids: RequestIdAllocator,
    placement: PlacementConfig,
}

impl Scheduler {
    pub fn new(
        address: HostPort,
        cluster: Arc<dyn ClusterState>,
        placement: PlacementConfig,
    ) -> Self {
        let ids = RequestIdAllocator::new(&address);
        Self {
            address,
            cluster,
            worker_pool: Arc::new(ChannelPool::new()),
            frontend_pool: Arc::new(ChannelPool::new()),
            frontends: RwLock::new(HashMap::new()),
            registry: RequestRegistry::new(),
            ids,
            placement,
        }
    }

    pub fn address(&self) -> &HostPort {
        &self.address
    }

    /// Requests with reservations still outstanding.
    pub fn pending_requests(&self) -> usize {
        self.registry.len()
    }

    /// Record a frontend's message endpoint and start watching its
    /// application. Re-registration overwrites the endpoint.
    pub async fn register_frontend(&self, app: &str, address: &str) -> bool {
        let address: HostPort = match address.parse() {
            Ok(addr) => addr,
            Err(e) => {
                error!(%app, error = %e, "bad address from frontend");
                return false;
            }
        };
        self.frontends.write().await.insert(app.to_string(), address);
        self.cluster.watch_application(app).await
    }

    /// Admit a request: allocate its ID, compute the reservation plan, and
    /// dispatch one batch per probed worker. Returns once every dispatch
    /// has been initiated; worker replies are not awaited.
    pub async fn submit_job(&self, request: SchedulingRequest) -> String {
        let start = Instant::now();
        let request_id = self.ids.next_id();
        audit::arrived(&request_id, request.tasks.len(), &self.address);

        let mut workers = self.cluster.backends(&request.app).await;
        let constrained = request.has_constraints();
        let probe_ratio = request.probe_ratio.unwrap_or(if constrained {
            self.placement.probe_ratio_constrained
        } else {
            self.placement.probe_ratio_unconstrained
        });

        if self.placement.force_data_spread {
            if let Some(prefs) = spread_preference(&request) {
                exclude_preferred_workers(&request_id, &mut workers, prefs);
            }
        }

        let mut placer: Box<dyn TaskPlacer> = if constrained {
            Box::new(ConstrainedPlacer::new(&request_id, probe_ratio))
        } else {
            Box::new(UnconstrainedPlacer::new(&request_id, probe_ratio))
        };
        let batches = placer.plan(&request, &request_id, &workers, &self.address);

        if placer.all_responses_received() {
            // No reservations were issued (no workers, or no tasks); there
            // will never be a pull to retire the placer, so don't install it.
            debug!(%request_id, "plan issued no reservations; request complete at submission");
        } else {
            self.registry.insert(&request_id, placer);
        }

        for (worker, batch) in batches {
            audit::launch_enqueue_task(&request_id, &worker);
            if let Err(e) = self.dispatch_reservations(&worker, batch).await {
                // Best-effort broadcast: the remaining workers must still be
                // contacted and the placer stays installed.
                error!(%request_id, worker = %worker, error = %e, "reservation dispatch failed");
            }
        }

        debug!(
            %request_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "all reservations dispatched"
        );
        request_id
    }

    /// Answer a worker's pull with at most one launch spec. Never raises:
    /// any detected inconsistency is logged and answered empty.
    pub async fn get_task(&self, request_id: &str, worker: &HostPort) -> Vec<LaunchSpec> {
        match self.try_get_task(request_id, worker) {
            Ok(specs) => specs,
            Err(e) => {
                error!(%request_id, worker = %worker, error = %e, "task pull answered empty");
                Vec::new()
            }
        }
    }

    fn try_get_task(&self, request_id: &str, worker: &HostPort) -> SchedulerResult<Vec<LaunchSpec>> {
        let outcome = self
            .registry
            .assign(request_id, worker)
            .ok_or_else(|| SchedulerError::UnknownRequest(request_id.to_string()))?;

        if outcome.specs.len() > 1 {
            return Err(SchedulerError::Protocol {
                request_id: request_id.to_string(),
                detail: format!("placer returned {} tasks for one pull", outcome.specs.len()),
            });
        }

        match outcome.specs.first() {
            Some(spec) => audit::assigned_task(request_id, &spec.task_id, worker),
            None => audit::get_task_no_task(request_id),
        }
        if outcome.retired {
            debug!(%request_id, "all responses received; request retired");
        }
        Ok(outcome.specs)
    }

    /// Relay a task-status message to the application's frontend.
    pub async fn send_frontend_message(
        &self,
        app: &str,
        task_id: FullTaskId,
        status: i32,
        payload: Vec<u8>,
    ) {
        if let Err(e) = self.try_send_frontend_message(app, task_id, status, payload).await {
            error!(%app, error = %e, "frontend message not sent");
        }
    }

    async fn try_send_frontend_message(
        &self,
        app: &str,
        task_id: FullTaskId,
        status: i32,
        payload: Vec<u8>,
    ) -> SchedulerResult<()> {
        let frontend = self
            .frontends
            .read()
            .await
            .get(app)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownApplication(app.to_string()))?;

        let channel = self.frontend_pool.checkout(&frontend).await?;
        let pool = Arc::clone(&self.frontend_pool);
        let app = app.to_string();
        tokio::spawn(async move {
            let mut client = FrontendServiceClient::new(channel.clone());
            let request = proto::FrontendMessageRequest {
                app: app.clone(),
                task_id: Some(task_id.into()),
                status,
                payload,
            };
            match client.frontend_message(request).await {
                Ok(_) => pool.checkin(&frontend, channel),
                Err(e) => {
                    // The channel may be in a bad state; it is not returned.
                    error!(%app, frontend = %frontend, error = %e, "frontend message failed");
                }
            }
        });
        Ok(())
    }

    /// Fire one reservation batch at a worker. The call completes in the
    /// background; the channel returns to the pool only on success.
    async fn dispatch_reservations(
        &self,
        worker: &HostPort,
        batch: ReservationBatch,
    ) -> SchedulerResult<()> {
        let channel = self.worker_pool.checkout(worker).await?;
        let pool = Arc::clone(&self.worker_pool);
        let worker = worker.clone();
        let request_id = batch.request_id.clone();
        debug!(%request_id, worker = %worker, reservations = batch.num_reservations, "dispatching reservations");

        tokio::spawn(async move {
            let mut client = NodeMonitorServiceClient::new(channel.clone());
            match client
                .enqueue_task_reservations(proto::ReservationBatch::from(batch))
                .await
            {
                Ok(_) => {
                    pool.checkin(&worker, channel);
                    audit::complete_enqueue_task(&request_id, &worker);
                }
                Err(e) => {
                    error!(
                        %request_id,
                        worker = %worker,
                        error = %e,
                        "enqueue reservations failed"
                    );
                }
            }
        });
        Ok(())
    }
}

/// Deliberate special case, not part of the placement policy: a job
/// submitted at probe ratio 3 whose tasks all pin the same one or two hosts
/// is seeding data replicas, and the pinned hosts must be excluded from
/// probing so fresh workers pick up the tasks. Returns the shared
/// preference list when the rule applies.
fn spread_preference(request: &SchedulingRequest) -> Option<&[String]> {
    if request.probe_ratio != Some(3.0) {
        return None;
    }
    let prefs = request.tasks.first()?.preference.as_slice();
    if prefs.is_empty() || prefs.len() > 2 {
        return None;
    }
    request
        .tasks
        .iter()
        .all(|t| t.preference.as_slice() == prefs)
        .then_some(prefs)
}

/// Drop every worker whose host appears in `prefs`.
fn exclude_preferred_workers(request_id: &str, workers: &mut Vec<HostPort>, prefs: &[String]) {
    for node in prefs {
        if !workers.iter().any(|w| w.host == *node) {
            debug!(%request_id, %node, "preferred host not in worker set; nothing to exclude");
        }
    }
    workers.retain(|w| !prefs.iter().any(|node| *node == w.host));
    debug!(%request_id, remaining = workers.len(), "preferred hosts excluded from probing");
}
