//! Domain types for the probegrid scheduler.
//!
//! These types flow between the frontend-facing RPC surface, the task
//! placers, and the worker-facing reservation dispatch. All are serializable
//! so they can be logged and carried over the wire unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Addresses ──────────────────────────────────────────────────────

/// A network endpoint identified by host and port.
///
/// Used for worker identity, frontend callbacks, and the scheduler's own
/// advertised address. Displays as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Errors from parsing a `host:port` string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostPortParseError {
    #[error("missing ':' separator in address: {0}")]
    MissingSeparator(String),

    #[error("empty host in address: {0}")]
    EmptyHost(String),

    #[error("invalid port in address: {0}")]
    InvalidPort(String),
}

impl FromStr for HostPort {
    type Err = HostPortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| HostPortParseError::MissingSeparator(s.to_string()))?;
        if host.is_empty() {
            return Err(HostPortParseError::EmptyHost(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| HostPortParseError::InvalidPort(s.to_string()))?;
        Ok(HostPort::new(host, port))
    }
}

// ── Scheduling request ─────────────────────────────────────────────

/// One task within a scheduling request.
///
/// `preference` lists candidate worker hosts; empty means the task may run
/// anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: String,
    /// Opaque payload handed back to the worker at launch.
    pub payload: Vec<u8>,
    /// Candidate worker host addresses, in preference order.
    #[serde(default)]
    pub preference: Vec<String>,
}

impl TaskSpec {
    pub fn new(task_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            task_id: task_id.into(),
            payload,
            preference: Vec::new(),
        }
    }

    pub fn with_preference(mut self, nodes: Vec<String>) -> Self {
        self.preference = nodes;
        self
    }
}

/// A job submission from a frontend: an application, its tasks, and an
/// optional probe ratio override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    pub app: String,
    pub tasks: Vec<TaskSpec>,
    /// Reservations issued per task; must be >= 1.0 when set.
    pub probe_ratio: Option<f64>,
}

impl SchedulingRequest {
    /// True when any task restricts which workers may run it.
    pub fn has_constraints(&self) -> bool {
        self.tasks.iter().any(|t| !t.preference.is_empty())
    }
}

// ── Reservation batch ──────────────────────────────────────────────

/// Reservation credits sent to one worker for one request.
///
/// The worker treats the count as opaque queue credits; `tasks` lists the
/// tasks eligible to fill those credits so the worker can pre-stage them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationBatch {
    pub request_id: String,
    pub app: String,
    /// Callback address the worker uses to pull a task.
    pub scheduler: HostPort,
    pub num_reservations: u32,
    pub tasks: Vec<TaskSpec>,
}

// ── Launch spec ────────────────────────────────────────────────────

/// Reply to a worker's task pull: one pending task, ready to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub task_id: String,
    pub payload: Vec<u8>,
}

impl From<&TaskSpec> for LaunchSpec {
    fn from(task: &TaskSpec) -> Self {
        Self {
            task_id: task.task_id.clone(),
            payload: task.payload.clone(),
        }
    }
}

// ── Full task id ───────────────────────────────────────────────────

/// Globally unique task identity used by completion notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullTaskId {
    pub request_id: String,
    pub task_id: String,
    pub app: String,
}
