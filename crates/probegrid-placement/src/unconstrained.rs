//! Unconstrained placer — uniform random probing.
//!
//! Issues `ceil(probe_ratio × task_count)` reservation credits across
//! workers chosen uniformly at random. Any probed worker may bind any task:
//! every batch carries the full task list, and tasks bind in insertion order
//! to whichever worker pulls first.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use probe_core::{HostPort, LaunchSpec, ReservationBatch, SchedulingRequest, TaskSpec};

use crate::placer::{probe_count, TaskPlacer};

pub struct UnconstrainedPlacer {
    request_id: String,
    probe_ratio: f64,
    rng: StdRng,
    /// Remaining reservation credits per probed worker.
    credits: HashMap<HostPort, u32>,
    /// Tasks not yet bound, in submission order.
    unassigned: VecDeque<TaskSpec>,
    issued: u32,
    responses: u32,
    planned: bool,
}

impl UnconstrainedPlacer {
    pub fn new(request_id: impl Into<String>, probe_ratio: f64) -> Self {
        Self::with_rng(request_id, probe_ratio, StdRng::from_entropy())
    }

    /// Construct with an explicit RNG. Identical inputs and seed produce an
    /// identical plan.
    pub fn with_rng(request_id: impl Into<String>, probe_ratio: f64, rng: StdRng) -> Self {
        Self {
            request_id: request_id.into(),
            probe_ratio,
            rng,
            credits: HashMap::new(),
            unassigned: VecDeque::new(),
            issued: 0,
            responses: 0,
            planned: false,
        }
    }

    /// Total credits issued at plan time.
    pub fn reservations_issued(&self) -> u32 {
        self.issued
    }
}

impl TaskPlacer for UnconstrainedPlacer {
    fn plan(
        &mut self,
        request: &SchedulingRequest,
        request_id: &str,
        workers: &[HostPort],
        scheduler: &HostPort,
    ) -> HashMap<HostPort, ReservationBatch> {
        self.planned = true;
        self.unassigned = request.tasks.iter().cloned().collect();

        let total = probe_count(self.probe_ratio, request.tasks.len());
        if total == 0 || workers.is_empty() {
            debug!(
                request_id = %self.request_id,
                workers = workers.len(),
                tasks = request.tasks.len(),
                "nothing to probe"
            );
            return HashMap::new();
        }

        // One credit each for a random subset first; if the ratio asks for
        // more credits than there are workers, spread the excess by repeated
        // random selection with replacement.
        let distinct = (total as usize).min(workers.len());
        for worker in workers.choose_multiple(&mut self.rng, distinct) {
            self.credits.insert(worker.clone(), 1);
        }
        let mut extra = total - distinct as u32;
        while extra > 0 {
            let Some(worker) = workers.choose(&mut self.rng) else {
                break;
            };
            *self.credits.entry(worker.clone()).or_insert(0) += 1;
            extra -= 1;
        }

        self.issued = self.credits.values().sum();
        debug!(
            request_id = %self.request_id,
            reservations = self.issued,
            workers = self.credits.len(),
            "placement plan computed"
        );

        self.credits
            .iter()
            .map(|(worker, &count)| {
                (
                    worker.clone(),
                    ReservationBatch {
                        request_id: request_id.to_string(),
                        app: request.app.clone(),
                        scheduler: scheduler.clone(),
                        num_reservations: count,
                        tasks: request.tasks.clone(),
                    },
                )
            })
            .collect()
    }

    fn assign_task(&mut self, worker: &HostPort) -> Vec<LaunchSpec> {
        let Some(remaining) = self.credits.get_mut(worker) else {
            debug!(
                request_id = %self.request_id,
                worker = %worker,
                "task pull from worker that holds no reservation"
            );
            return Vec::new();
        };
        if *remaining == 0 {
            debug!(
                request_id = %self.request_id,
                worker = %worker,
                "task pull after credits exhausted"
            );
            return Vec::new();
        }
        *remaining -= 1;
        self.responses += 1;

        match self.unassigned.pop_front() {
            Some(task) => vec![LaunchSpec::from(&task)],
            None => Vec::new(),
        }
    }

    fn all_responses_received(&self) -> bool {
        self.planned && self.responses >= self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers(n: u16) -> Vec<HostPort> {
        (0..n).map(|i| HostPort::new(format!("10.0.0.{i}"), 20502)).collect()
    }

    fn request(task_count: usize) -> SchedulingRequest {
        SchedulingRequest {
            app: "app".to_string(),
            tasks: (0..task_count)
                .map(|i| TaskSpec::new(format!("t{i}"), vec![i as u8]))
                .collect(),
            probe_ratio: None,
        }
    }

    fn scheduler_addr() -> HostPort {
        HostPort::new("10.0.1.1", 20503)
    }

    fn seeded(request_id: &str, ratio: f64, seed: u64) -> UnconstrainedPlacer {
        UnconstrainedPlacer::with_rng(request_id, ratio, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn plan_issues_ceil_of_ratio_times_tasks() {
        let mut placer = seeded("r0", 2.0, 1);
        let batches = placer.plan(&request(2), "r0", &workers(8), &scheduler_addr());

        let total: u32 = batches.values().map(|b| b.num_reservations).sum();
        assert_eq!(total, 4);
        // Enough workers for every credit to land on a distinct one.
        assert_eq!(batches.len(), 4);
        assert_eq!(placer.reservations_issued(), 4);
    }

    #[test]
    fn plan_replicates_credits_when_ratio_exceeds_workers() {
        let mut placer = seeded("r0", 3.0, 7);
        let batches = placer.plan(&request(2), "r0", &workers(4), &scheduler_addr());

        // 6 credits over 4 workers: all workers probed, extras stacked.
        let total: u32 = batches.values().map(|b| b.num_reservations).sum();
        assert_eq!(total, 6);
        assert_eq!(batches.len(), 4);
        assert!(batches.values().all(|b| b.num_reservations >= 1));
    }

    #[test]
    fn plan_with_ratio_one_issues_one_credit_per_task() {
        let mut placer = seeded("r0", 1.0, 3);
        let batches = placer.plan(&request(3), "r0", &workers(10), &scheduler_addr());

        let total: u32 = batches.values().map(|b| b.num_reservations).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn plan_with_no_workers_is_empty_and_immediately_drained() {
        let mut placer = seeded("r0", 2.0, 1);
        let batches = placer.plan(&request(2), "r0", &[], &scheduler_addr());

        assert!(batches.is_empty());
        assert!(placer.all_responses_received());
        assert!(placer.assign_task(&HostPort::new("10.0.0.1", 20502)).is_empty());
    }

    #[test]
    fn batches_carry_full_task_list_and_scheduler_address() {
        let mut placer = seeded("r0", 2.0, 1);
        let batches = placer.plan(&request(2), "r0", &workers(4), &scheduler_addr());

        for batch in batches.values() {
            assert_eq!(batch.request_id, "r0");
            assert_eq!(batch.app, "app");
            assert_eq!(batch.scheduler, scheduler_addr());
            assert_eq!(batch.tasks.len(), 2);
        }
    }

    #[test]
    fn tasks_bind_in_insertion_order() {
        let mut placer = seeded("r0", 2.0, 5);
        let batches = placer.plan(&request(2), "r0", &workers(4), &scheduler_addr());
        let probed: Vec<HostPort> = batches.keys().cloned().collect();

        let first = placer.assign_task(&probed[0]);
        let second = placer.assign_task(&probed[1]);
        assert_eq!(first[0].task_id, "t0");
        assert_eq!(second[0].task_id, "t1");

        // Remaining pulls find no pending tasks.
        assert!(placer.assign_task(&probed[2]).is_empty());
    }

    #[test]
    fn no_task_is_assigned_twice() {
        let mut placer = seeded("r0", 2.0, 11);
        let batches = placer.plan(&request(2), "r0", &workers(4), &scheduler_addr());

        let mut seen = Vec::new();
        for worker in batches.keys() {
            for spec in placer.assign_task(worker) {
                assert!(!seen.contains(&spec.task_id));
                seen.push(spec.task_id);
            }
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn drained_only_after_every_credit_answered() {
        let mut placer = seeded("r0", 2.0, 2);
        let batches = placer.plan(&request(2), "r0", &workers(4), &scheduler_addr());
        let probed: Vec<HostPort> = batches.keys().cloned().collect();

        for worker in &probed {
            assert!(!placer.all_responses_received());
            placer.assign_task(worker);
        }
        assert!(placer.all_responses_received());
    }

    #[test]
    fn pull_from_unprobed_worker_does_not_count_as_response() {
        let mut placer = seeded("r0", 1.0, 2);
        placer.plan(&request(1), "r0", &workers(4), &scheduler_addr());

        let stranger = HostPort::new("192.168.0.9", 20502);
        assert!(placer.assign_task(&stranger).is_empty());
        assert!(!placer.all_responses_received());
    }

    #[test]
    fn exhausted_worker_gets_empty_without_counting() {
        let mut placer = seeded("r0", 2.0, 2);
        // One task, ratio 2, single worker: that worker holds both credits.
        let batches = placer.plan(&request(1), "r0", &workers(1), &scheduler_addr());
        let worker = batches.keys().next().unwrap().clone();
        assert_eq!(batches[&worker].num_reservations, 2);

        assert_eq!(placer.assign_task(&worker).len(), 1);
        assert!(placer.assign_task(&worker).is_empty());
        assert!(placer.all_responses_received());

        // A third pull is past the credits; still empty, still drained.
        assert!(placer.assign_task(&worker).is_empty());
        assert!(placer.all_responses_received());
    }

    #[test]
    fn identical_seed_produces_identical_plan() {
        let req = request(3);
        let pool = workers(10);

        let mut a = seeded("r0", 2.0, 42);
        let mut b = seeded("r0", 2.0, 42);
        let plan_a = a.plan(&req, "r0", &pool, &scheduler_addr());
        let plan_b = b.plan(&req, "r0", &pool, &scheduler_addr());

        assert_eq!(plan_a, plan_b);
    }
}
