//! probegrid-cluster — cluster membership views and RPC plumbing.
//!
//! Provides the gRPC definitions shared by schedulers, workers, frontends,
//! and the state store, plus the three interchangeable cluster-state
//! providers a scheduler can run against.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── ClusterState (trait)
//!   │   ├── StandaloneState — in-memory, fed by RegisterBackend RPCs
//!   │   ├── ConfigState     — static worker list from probed.toml
//!   │   └── StoreState      — snapshot updated by a state-store stream
//!   └── ChannelPool — reusable tonic channels, keyed by endpoint
//!
//! Worker (node monitor)
//!   ├── receives EnqueueTaskReservations (queue credits)
//!   └── calls GetTask on the scheduler when idle
//! ```

pub mod convert;
pub mod pool;
pub mod state;
pub mod store;

/// Generated protobuf types and gRPC service stubs.
pub mod proto {
    tonic::include_proto!("probegrid.rpc");
}

pub use pool::ChannelPool;
pub use state::{ClusterState, ConfigState, StandaloneState};
pub use store::StoreState;
