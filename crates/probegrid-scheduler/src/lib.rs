//! probegrid-scheduler — the per-request scheduling façade.
//!
//! One `Scheduler` is one replica among many; replicas share no per-request
//! state. A submission allocates a cluster-unique request ID, probes more
//! workers than it has tasks, and installs a placer that serves the
//! late-binding pulls until every reservation credit has been answered.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── ClusterState (worker set per application, snapshot per submission)
//!   ├── RequestIdAllocator (ip_port_counter, atomic)
//!   ├── RequestRegistry (request id → placer, concurrent)
//!   ├── ChannelPool × 2 (worker + frontend endpoints)
//!   └── audit (structured request lifecycle events)
//! ```

pub mod audit;
pub mod error;
pub mod id;
pub mod registry;
pub mod scheduler;
pub mod server;

pub use error::{SchedulerError, SchedulerResult};
pub use id::RequestIdAllocator;
pub use registry::{AssignOutcome, RequestRegistry};
pub use scheduler::Scheduler;
pub use server::SchedulerServer;
