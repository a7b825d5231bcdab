//! Constrained placer — per-task placement preferences.
//!
//! Each task probes `ceil(probe_ratio)` of its preferred workers, chosen
//! uniformly at random; when preferences are exhausted or do not resolve to
//! any known worker, selection falls back to the full worker set. A worker's
//! batch lists exactly the tasks that probed it, and a pull only ever binds
//! a task that is eligible to run there.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use probe_core::{HostPort, LaunchSpec, ReservationBatch, SchedulingRequest, TaskSpec};

use crate::placer::TaskPlacer;

/// A task awaiting binding, with the workers that hold credits for it.
struct PendingTask {
    spec: TaskSpec,
    eligible: Vec<HostPort>,
}

pub struct ConstrainedPlacer {
    request_id: String,
    probe_ratio: f64,
    rng: StdRng,
    /// Remaining reservation credits per probed worker.
    credits: HashMap<HostPort, u32>,
    /// Tasks not yet bound, in submission order.
    pending: Vec<PendingTask>,
    issued: u32,
    responses: u32,
    planned: bool,
}

impl ConstrainedPlacer {
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
            pending: Vec::new(),
            issued: 0,
            responses: 0,
            planned: false,
        }
    }

    /// Total credits issued at plan time.
    pub fn reservations_issued(&self) -> u32 {
        self.issued
    }

    /// Workers that resolve from a task's preference list, in preference
    /// order. Entries matching no known worker are logged and skipped.
    fn resolve_preferences(&self, task: &TaskSpec, workers: &[HostPort]) -> Vec<HostPort> {
        let mut resolved = Vec::new();
        for node in &task.preference {
            let mut matched = false;
            for worker in workers.iter().filter(|w| w.host == *node) {
                matched = true;
                if !resolved.contains(worker) {
                    resolved.push(worker.clone());
                }
            }
            if !matched {
                warn!(
                    request_id = %self.request_id,
                    task_id = %task.task_id,
                    node = %node,
                    "placement preference does not resolve to a known worker, ignoring"
                );
            }
        }
        resolved
    }
}

impl TaskPlacer for ConstrainedPlacer {
    fn plan(
        &mut self,
        request: &SchedulingRequest,
        request_id: &str,
        workers: &[HostPort],
        scheduler: &HostPort,
    ) -> HashMap<HostPort, ReservationBatch> {
        self.planned = true;
        // Per-task probe count; the ratio is a per-task multiplier here.
        let per_task = (self.probe_ratio.ceil() as usize).max(1);

        let mut batch_tasks: HashMap<HostPort, Vec<TaskSpec>> = HashMap::new();

        for task in &request.tasks {
            if workers.is_empty() {
                self.pending.push(PendingTask {
                    spec: task.clone(),
                    eligible: Vec::new(),
                });
                continue;
            }

            let preferred = self.resolve_preferences(task, workers);
            let mut chosen: Vec<HostPort> = preferred
                .choose_multiple(&mut self.rng, per_task.min(preferred.len()))
                .cloned()
                .collect();

            if chosen.len() < per_task {
                // Preferences exhausted (or unresolvable): pick the rest
                // from the remaining workers at random.
                let rest: Vec<HostPort> = workers
                    .iter()
                    .filter(|w| !chosen.contains(w))
                    .cloned()
                    .collect();
                let need = per_task - chosen.len();
                chosen.extend(
                    rest.choose_multiple(&mut self.rng, need.min(rest.len()))
                        .cloned(),
                );
            }

            for worker in &chosen {
                *self.credits.entry(worker.clone()).or_insert(0) += 1;
                batch_tasks
                    .entry(worker.clone())
                    .or_default()
                    .push(task.clone());
            }
            self.pending.push(PendingTask {
                spec: task.clone(),
                eligible: chosen,
            });
        }

        self.issued = self.credits.values().sum();
        debug!(
            request_id = %self.request_id,
            reservations = self.issued,
            workers = self.credits.len(),
            "constrained placement plan computed"
        );

        batch_tasks
            .into_iter()
            .map(|(worker, tasks)| {
                let count = self.credits.get(&worker).copied().unwrap_or(0);
                (
                    worker,
                    ReservationBatch {
                        request_id: request_id.to_string(),
                        app: request.app.clone(),
                        scheduler: scheduler.clone(),
                        num_reservations: count,
                        tasks,
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

        // First unbound task eligible on this worker, in submission order.
        match self
            .pending
            .iter()
            .position(|p| p.eligible.contains(worker))
        {
            Some(pos) => {
                let task = self.pending.remove(pos);
                vec![LaunchSpec::from(&task.spec)]
            }
            None => Vec::new(),
        }
    }

    fn all_responses_received(&self) -> bool {
        self.planned && self.responses >= self.issued
    }
}
