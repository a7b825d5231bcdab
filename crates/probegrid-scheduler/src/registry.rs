//! Request registry — live request IDs and their placers.
//!
//! A placer is inserted exactly once during submission and removed exactly
//! once, by whichever pull observes it drained. Concurrent pulls for the
//! same request serialize on the placer's own lock, so the placer sees a
//! linear history of responses.

use dashmap::DashMap;
use parking_lot::Mutex;

use probe_core::{HostPort, LaunchSpec};
use probegrid_placement::TaskPlacer;

/// Result of answering one pull through the registry.
pub struct AssignOutcome {
    /// What the placer returned (the façade validates the length).
    pub specs: Vec<LaunchSpec>,
    /// True when this pull observed the placer drained and removed it.
    pub retired: bool,
}

#[derive(Default)]
pub struct RequestRegistry {
    placers: DashMap<String, Mutex<Box<dyn TaskPlacer>>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, request_id: &str, placer: Box<dyn TaskPlacer>) {
        self.placers.insert(request_id.to_string(), Mutex::new(placer));
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.placers.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.placers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placers.is_empty()
    }

    /// Answer one pull. Returns `None` when the request is unknown (already
    /// retired, or never submitted here).
    ///
    /// Removal races are benign: when two pulls both observe the placer
    /// drained, `DashMap::remove` yields the entry to exactly one of them.
    pub fn assign(&self, request_id: &str, worker: &HostPort) -> Option<AssignOutcome> {
        let (specs, drained) = {
            let entry = self.placers.get(request_id)?;
            let mut placer = entry.lock();
            let specs = placer.assign_task(worker);
            (specs, placer.all_responses_received())
        };

        let retired = drained && self.placers.remove(request_id).is_some();
        Some(AssignOutcome { specs, retired })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::{SchedulingRequest, TaskSpec};
    use probegrid_placement::UnconstrainedPlacer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn worker() -> HostPort {
        HostPort::new("10.0.0.1", 20502)
    }

    /// A placer whose plan puts `ratio` credits on a single worker for one
    /// task.
    fn single_worker_placer(ratio: f64) -> Box<dyn TaskPlacer> {
        let mut placer = UnconstrainedPlacer::with_rng("r0", ratio, StdRng::seed_from_u64(1));
        let request = SchedulingRequest {
            app: "app".to_string(),
            tasks: vec![TaskSpec::new("t0", vec![])],
            probe_ratio: None,
        };
        placer.plan(&request, "r0", &[worker()], &HostPort::new("10.0.1.1", 20503));
        Box::new(placer)
    }

    #[test]
    fn unknown_request_returns_none() {
        let registry = RequestRegistry::new();
        assert!(registry.assign("missing", &worker()).is_none());
    }

    #[test]
    fn drained_placer_is_removed_once() {
        let registry = RequestRegistry::new();
        registry.insert("r0", single_worker_placer(1.0));
        assert!(registry.contains("r0"));

        let outcome = registry.assign("r0", &worker()).unwrap();
        assert_eq!(outcome.specs.len(), 1);
        assert!(outcome.retired);
        assert!(registry.is_empty());

        // Late pull after retirement.
        assert!(registry.assign("r0", &worker()).is_none());
    }

    #[test]
    fn placer_survives_until_all_credits_answered() {
        let registry = RequestRegistry::new();
        registry.insert("r0", single_worker_placer(2.0));

        let first = registry.assign("r0", &worker()).unwrap();
        assert_eq!(first.specs.len(), 1);
        assert!(!first.retired);
        assert!(registry.contains("r0"));

        let second = registry.assign("r0", &worker()).unwrap();
        assert!(second.specs.is_empty());
        assert!(second.retired);
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_pulls_bind_the_task_exactly_once() {
        use std::sync::Arc;
        use std::thread;

        for _ in 0..50 {
            let registry = Arc::new(RequestRegistry::new());
            registry.insert("r0", single_worker_placer(2.0));

            let mut handles = vec![];
            for _ in 0..2 {
                let registry = registry.clone();
                handles.push(thread::spawn(move || {
                    registry
                        .assign("r0", &worker())
                        .map(|o| o.specs.len())
                        .unwrap_or(0)
                }));
            }

            let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
            assert_eq!(total, 1);
            assert!(registry.is_empty());
        }
    }
}
