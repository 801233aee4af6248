use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::service::{SubmissionJob, Worker};
use crate::Result;

/// Returns the index of the smallest load, scanning from `start` and wrapping
/// around. Ties go to the first one found. `None` loads are skipped.
pub fn select_least_loaded(loads: &[Option<usize>], start: usize) -> Option<usize> {
    let len = loads.len();
    (0..len)
        .map(|offset| (start + offset) % len)
        .filter_map(|i| loads[i].map(|depth| (i, depth)))
        .fold(None, |best: Option<(usize, usize)>, (i, depth)| match best {
            Some((_, best_depth)) if best_depth <= depth => best,
            _ => Some((i, depth)),
        })
        .map(|(i, _)| i)
}

/// Dispatches submissions over the workers of several accounts.
pub struct AccountPool {
    workers: Vec<Worker>,
    cursor: AtomicUsize,
}

impl AccountPool {
    pub fn new(workers: Vec<Worker>) -> Result<Self> {
        if workers.is_empty() {
            return Err(anyhow!("Account pool needs at least one account"));
        }
        Ok(Self {
            workers,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn depths(&self) -> Vec<usize> {
        self.workers.iter().map(Worker::depth).collect()
    }

    /// Depth of each worker, `None` for disabled ones.
    fn loads(&self) -> Vec<Option<usize>> {
        self.workers
            .iter()
            .map(|worker| {
                if worker.is_disabled() {
                    None
                } else {
                    Some(worker.depth())
                }
            })
            .collect()
    }

    /// Queues `job` on the least loaded worker and returns that worker's handle.
    ///
    /// Disabled workers are skipped. When every worker is disabled the job
    /// still goes to one of them and fails there without a request.
    pub fn submit(&self, job: SubmissionJob) -> &str {
        let start = self.cursor.fetch_add(1, Ordering::SeqCst) % self.workers.len();
        let index = select_least_loaded(&self.loads(), start).unwrap_or_else(|| {
            warn!("Every account is disabled, {} will fail", job.problem_ref());
            start
        });
        let worker = &self.workers[index];
        debug!("Dispatching {} to {}", job.problem_ref(), worker.handle());
        worker.push(job);
        worker.handle()
    }
}
