//! Channel pool — reusable RPC connections, keyed by endpoint.
//!
//! Dispatch paths check a channel out, issue their call, and check the
//! channel back in only on success. A channel that saw a transport error is
//! dropped on the floor; the next checkout dials a fresh connection.

use dashmap::DashMap;
use tonic::transport::{Channel, Endpoint};

use probe_core::HostPort;

#[derive(Default)]
pub struct ChannelPool {
    idle: DashMap<HostPort, Vec<Channel>>,
}

impl ChannelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an idle channel for `addr`, dialing a new one when none is
    /// pooled. Dial failures surface as transport errors.
    pub async fn checkout(&self, addr: &HostPort) -> Result<Channel, tonic::transport::Error> {
        if let Some(mut idle) = self.idle.get_mut(addr) {
            if let Some(channel) = idle.pop() {
                return Ok(channel);
            }
        }
        Endpoint::from_shared(format!("http://{addr}"))?.connect().await
    }

    /// Return a healthy channel to the pool.
    pub fn checkin(&self, addr: &HostPort, channel: Channel) {
        self.idle.entry(addr.clone()).or_default().push(channel);
    }

    /// Idle channels currently pooled for `addr`.
    pub fn idle_count(&self, addr: &HostPort) -> usize {
        self.idle.get(addr).map(|v| v.len()).unwrap_or(0)
    }
}
