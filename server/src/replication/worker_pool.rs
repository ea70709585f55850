use crate::configs::server::ShutdownPolicy;
use crate::replication::dispatcher::hash_index;
use crate::replication::task::{ReplContext, ReplTask};
use crate::replication::worker::ReplBgWorker;
use crate::server_error::ServerError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// A fixed-size pool of background workers, twice the configured sync thread
/// count. The upper half (indices `0..size / 2`) executes binlog-append tasks,
/// the lower half (`size / 2..size`) storage-apply tasks; the split is what
/// keeps the append and apply streams of one partition on dedicated FIFOs.
/// The worker list is read-only after construction.
pub struct ReplWorkerPool {
    workers: Vec<ReplBgWorker>,
    next_avail: AtomicUsize,
}

impl ReplWorkerPool {
    pub fn new(sync_threads: u32, policy: ShutdownPolicy) -> Self {
        let pool_size = 2 * sync_threads as usize;
        let workers = (0..pool_size)
            .map(|index| ReplBgWorker::new(index, policy))
            .collect();
        Self {
            workers,
            next_avail: AtomicUsize::new(0),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// Producer handles of the lower-half workers, used by upper-half workers
    /// to hand over derived apply tasks.
    pub fn applier_senders(&self) -> Vec<flume::Sender<ReplTask>> {
        self.workers[self.pool_size() / 2..]
            .iter()
            .map(|worker| worker.sender())
            .collect()
    }

    /// Starts every worker thread. Any failure is unrecoverable: replication
    /// cannot safely proceed without its ordering substrate, so the caller
    /// must abort startup.
    pub fn start(&mut self, context: Arc<ReplContext>) -> Result<(), ServerError> {
        for worker in &mut self.workers {
            worker.start(context.clone())?;
        }
        info!("Started {} replication background workers", self.pool_size());
        Ok(())
    }

    /// Enqueues a task onto the worker at `index`; never blocks beyond the
    /// queue insertion.
    pub fn schedule_at(&self, index: usize, task: ReplTask) -> Result<(), ServerError> {
        let worker = self.workers.get(index).ok_or_else(|| {
            ServerError::CannotScheduleTask(format!("index {index} out of range"))
        })?;
        worker.schedule(task)
    }

    /// Enqueues an order-free task onto the next worker, advancing a cursor
    /// modulo the pool size. Independent of the hash-based dispatch used for
    /// replicated writes.
    pub fn schedule_round_robin(&self, task: ReplTask) -> Result<(), ServerError> {
        if self.workers.is_empty() {
            return Err(ServerError::CannotScheduleTask(
                "no background workers".to_string(),
            ));
        }

        let index = self.next_avail.fetch_add(1, Ordering::Relaxed) % self.pool_size();
        self.workers[index].schedule(task)
    }

    pub fn hash_index(&self, key: &str, select_upper_half: bool) -> usize {
        hash_index(key, select_upper_half, self.pool_size())
    }

    /// Stops the upper half first so no new apply tasks are produced, then the
    /// lower half, joining every thread.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        let half = self.pool_size() / 2;
        for worker in &mut self.workers[..half] {
            worker.stop();
        }
        for worker in &mut self.workers[half..] {
            worker.stop();
        }
        info!("Stopped {} replication background workers", self.pool_size());
    }
}
