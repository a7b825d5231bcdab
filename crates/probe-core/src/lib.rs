//! probe-core — shared domain types and configuration for probegrid.
//!
//! Everything that crosses a crate boundary lives here: the scheduling
//! request/task shapes, worker and frontend addresses, reservation batches,
//! and the `probed.toml` configuration parser.

pub mod config;
pub mod types;

pub use config::{ClusterConfig, ConfigError, DeploymentMode, PlacementConfig, ProbedConfig};
pub use types::{
    FullTaskId, HostPort, HostPortParseError, LaunchSpec, ReservationBatch, SchedulingRequest,
    TaskSpec,
};
