//! Request-ID allocation.
//!
//! IDs are `<host>_<port>_<counter>`. The counter makes IDs unique within
//! one scheduler (a counter rather than a request hash, because identical
//! jobs may be submitted repeatedly); host and port make them unique across
//! replicas, including replicas co-located on one machine.

use std::sync::atomic::{AtomicU64, Ordering};

use probe_core::HostPort;

pub struct RequestIdAllocator {
    host: String,
    port: u16,
    counter: AtomicU64,
}

impl RequestIdAllocator {
    /// `address` must be the address peers use to reach this scheduler.
    pub fn new(address: &HostPort) -> Self {
        Self {
            host: address.host.clone(),
            port: address.port,
            counter: AtomicU64::new(0),
        }
    }

    /// Allocate a fresh ID. Each call returns a different identifier.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}_{}", self.host, self.port, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_zero_and_increase() {
        let ids = RequestIdAllocator::new(&HostPort::new("10.0.0.1", 20503));
        assert_eq!(ids.next_id(), "10.0.0.1_20503_0");
        assert_eq!(ids.next_id(), "10.0.0.1_20503_1");
        assert_eq!(ids.next_id(), "10.0.0.1_20503_2");
    }

    #[test]
    fn colocated_schedulers_do_not_collide() {
        let a = RequestIdAllocator::new(&HostPort::new("10.0.0.1", 20503));
        let b = RequestIdAllocator::new(&HostPort::new("10.0.0.1", 20504));
        assert_ne!(a.next_id(), b.next_id());
    }

    #[test]
    fn concurrent_allocation_yields_unique_ids() {
        use std::collections::HashSet;
        use std::sync::Arc;
        use std::thread;

        let ids = Arc::new(RequestIdAllocator::new(&HostPort::new("10.0.0.1", 20503)));
        let mut handles = vec![];
        for _ in 0..4 {
            let ids = ids.clone();
            handles.push(thread::spawn(move || {
                (0..250).map(|_| ids.next_id()).collect::<Vec<_>>()
            }));
        }

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 1000);
    }
}
