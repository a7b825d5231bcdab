//! Scheduler gRPC server.
//!
//! Implements the `SchedulerService` interface: frontends register and
//! submit jobs, workers pull tasks and relay completion messages. In
//! standalone deployments workers also register themselves here.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{error, warn};

use probe_core::HostPort;
use probegrid_cluster::proto;
use probegrid_cluster::proto::scheduler_service_server::SchedulerService;
use probegrid_cluster::StandaloneState;

use crate::scheduler::Scheduler;

pub struct SchedulerServer {
    scheduler: Arc<Scheduler>,
    /// Present only in standalone deployments, where workers register
    /// directly with the scheduler instead of a shared state store.
    standalone: Option<Arc<StandaloneState>>,
}

impl SchedulerServer {
    pub fn new(scheduler: Arc<Scheduler>, standalone: Option<Arc<StandaloneState>>) -> Self {
        Self {
            scheduler,
            standalone,
        }
    }

    /// Get the tonic service for mounting on a gRPC server.
    pub fn into_service(self) -> proto::scheduler_service_server::SchedulerServiceServer<Self> {
        proto::scheduler_service_server::SchedulerServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl SchedulerService for SchedulerServer {
    async fn register_frontend(
        &self,
        request: Request<proto::RegisterFrontendRequest>,
    ) -> Result<Response<proto::RegisterFrontendReply>, Status> {
        let req = request.into_inner();
        let accepted = self.scheduler.register_frontend(&req.app, &req.address).await;
        Ok(Response::new(proto::RegisterFrontendReply { accepted }))
    }

    async fn submit_job(
        &self,
        request: Request<proto::SchedulingRequest>,
    ) -> Result<Response<proto::SubmitJobReply>, Status> {
        let req = request.into_inner();
        self.scheduler.submit_job(req.into()).await;
        Ok(Response::new(proto::SubmitJobReply {}))
    }

    async fn get_task(
        &self,
        request: Request<proto::GetTaskRequest>,
    ) -> Result<Response<proto::GetTaskReply>, Status> {
        let req = request.into_inner();
        let Some(worker) = req.worker else {
            return Err(Status::invalid_argument("missing worker identity"));
        };
        let specs = self
            .scheduler
            .get_task(&req.request_id, &worker.into())
            .await;
        Ok(Response::new(proto::GetTaskReply {
            specs: specs.into_iter().map(Into::into).collect(),
        }))
    }

    async fn send_frontend_message(
        &self,
        request: Request<proto::FrontendMessageRequest>,
    ) -> Result<Response<proto::FrontendMessageReply>, Status> {
        let req = request.into_inner();
        let Some(task_id) = req.task_id else {
            return Err(Status::invalid_argument("missing task id"));
        };
        self.scheduler
            .send_frontend_message(&req.app, task_id.into(), req.status, req.payload)
            .await;
        Ok(Response::new(proto::FrontendMessageReply {}))
    }

    async fn register_backend(
        &self,
        request: Request<proto::RegisterBackendRequest>,
    ) -> Result<Response<proto::RegisterBackendReply>, Status> {
        let req = request.into_inner();
        let Some(state) = &self.standalone else {
            warn!(app = %req.app, "backend registration outside standalone mode");
            return Ok(Response::new(proto::RegisterBackendReply { accepted: false }));
        };
        let accepted = match req.address.parse::<HostPort>() {
            Ok(addr) => {
                state.register_backend(&req.app, addr);
                true
            }
            Err(e) => {
                error!(app = %req.app, address = %req.address, error = %e, "bad backend address");
                false
            }
        };
        Ok(Response::new(proto::RegisterBackendReply { accepted }))
    }

    async fn deregister_backend(
        &self,
        request: Request<proto::DeregisterBackendRequest>,
    ) -> Result<Response<proto::DeregisterBackendReply>, Status> {
        let req = request.into_inner();
        let Some(state) = &self.standalone else {
            warn!(app = %req.app, "backend deregistration outside standalone mode");
            return Ok(Response::new(proto::DeregisterBackendReply { removed: false }));
        };
        let removed = match req.address.parse::<HostPort>() {
            Ok(addr) => state.deregister_backend(&req.app, &addr),
            Err(e) => {
                error!(app = %req.app, address = %req.address, error = %e, "bad backend address");
                false
            }
        };
        Ok(Response::new(proto::DeregisterBackendReply { removed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::config::PlacementConfig;
    use probegrid_cluster::ClusterState;

    fn standalone_server() -> (SchedulerServer, Arc<StandaloneState>) {
        let state = Arc::new(StandaloneState::new());
        let scheduler = Arc::new(Scheduler::new(
            HostPort::new("127.0.0.1", 20503),
            Arc::clone(&state) as Arc<dyn ClusterState>,
            PlacementConfig::default(),
        ));
        (SchedulerServer::new(scheduler, Some(Arc::clone(&state))), state)
    }

    #[tokio::test]
    async fn register_frontend_maps_parse_failure_to_rejection() {
        let (server, _) = standalone_server();

        let reply = server
            .register_frontend(Request::new(proto::RegisterFrontendRequest {
                app: "app".to_string(),
                address: "not-an-address".to_string(),
            }))
            .await
            .unwrap();
        assert!(!reply.into_inner().accepted);

        let reply = server
            .register_frontend(Request::new(proto::RegisterFrontendRequest {
                app: "app".to_string(),
                address: "127.0.0.1:9090".to_string(),
            }))
            .await
            .unwrap();
        assert!(reply.into_inner().accepted);
    }

    #[tokio::test]
    async fn get_task_requires_worker_identity() {
        let (server, _) = standalone_server();

        let status = server
            .get_task(Request::new(proto::GetTaskRequest {
                request_id: "r0".to_string(),
                worker: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn get_task_for_unknown_request_replies_empty() {
        let (server, _) = standalone_server();

        let reply = server
            .get_task(Request::new(proto::GetTaskRequest {
                request_id: "unknown_0_0".to_string(),
                worker: Some(proto::HostPort {
                    host: "127.0.0.1".to_string(),
                    port: 1,
                }),
            }))
            .await
            .unwrap();
        assert!(reply.into_inner().specs.is_empty());
    }

    #[tokio::test]
    async fn backend_registration_feeds_the_standalone_state() {
        let (server, state) = standalone_server();

        let reply = server
            .register_backend(Request::new(proto::RegisterBackendRequest {
                app: "app".to_string(),
                address: "127.0.0.1:20502".to_string(),
            }))
            .await
            .unwrap();
        assert!(reply.into_inner().accepted);
        assert_eq!(state.backends("app").await.len(), 1);

        let reply = server
            .deregister_backend(Request::new(proto::DeregisterBackendRequest {
                app: "app".to_string(),
                address: "127.0.0.1:20502".to_string(),
            }))
            .await
            .unwrap();
        assert!(reply.into_inner().removed);
        assert!(state.backends("app").await.is_empty());
    }

    #[tokio::test]
    async fn backend_registration_rejects_bad_address() {
        let (server, state) = standalone_server();

        let reply = server
            .register_backend(Request::new(proto::RegisterBackendRequest {
                app: "app".to_string(),
                address: "nope".to_string(),
            }))
            .await
            .unwrap();
        assert!(!reply.into_inner().accepted);
        assert!(state.backends("app").await.is_empty());
    }

    #[tokio::test]
    async fn submit_and_pull_over_the_wire_types() {
        let (server, state) = standalone_server();
        let worker = HostPort::new("127.0.0.1", 1);
        state.register_backend("app", worker.clone());

        server
            .submit_job(Request::new(proto::SchedulingRequest {
                app: "app".to_string(),
                tasks: vec![proto::TaskSpec {
                    task_id: "t0".to_string(),
                    payload: b"payload".to_vec(),
                    preference: None,
                }],
                probe_ratio: Some(1.0),
            }))
            .await
            .unwrap();

        // The request ID is allocated by this scheduler instance; the first
        // submission gets counter zero.
        let reply = server
            .get_task(Request::new(proto::GetTaskRequest {
                request_id: "127.0.0.1_20503_0".to_string(),
                worker: Some(worker.into()),
            }))
            .await
            .unwrap();
        let specs = reply.into_inner().specs;
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].task_id, "t0");
        assert_eq!(specs[0].payload, b"payload");
    }
}
