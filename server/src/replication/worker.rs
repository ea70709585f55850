use crate::configs::server::ShutdownPolicy;
use crate::replication::task::{ReplContext, ReplTask};
use crate::server_error::ServerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, trace};

/// A background worker: one unbounded FIFO of tasks plus one dedicated
/// execution thread. The thread is the queue's only consumer, so tasks sharing
/// a worker execute strictly in submission order. Stopping is cooperative - a
/// `Shutdown` sentinel is queued behind whatever is already in flight and the
/// stop flag is only consulted between tasks, never mid-task.
pub struct ReplBgWorker {
    name: String,
    sender: flume::Sender<ReplTask>,
    receiver: flume::Receiver<ReplTask>,
    stop: Arc<AtomicBool>,
    policy: ShutdownPolicy,
    handle: Option<JoinHandle<()>>,
}

impl ReplBgWorker {
    pub fn new(index: usize, policy: ShutdownPolicy) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            name: format!("shoal-repl-worker-{index}"),
            sender,
            receiver,
            stop: Arc::new(AtomicBool::new(false)),
            policy,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A producer handle for this worker's queue.
    pub fn sender(&self) -> flume::Sender<ReplTask> {
        self.sender.clone()
    }

    /// Spawns the execution thread. A spawn failure leaves replication without
    /// its ordering substrate, so callers must treat it as fatal for startup.
    pub fn start(&mut self, context: Arc<ReplContext>) -> Result<(), ServerError> {
        let name = self.name.clone();
        let receiver = self.receiver.clone();
        let stop = self.stop.clone();
        let policy = self.policy;
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Ok(task) = receiver.recv() {
                    if let ReplTask::Shutdown = task {
                        break;
                    }

                    if policy == ShutdownPolicy::Discard && stop.load(Ordering::Acquire) {
                        continue;
                    }

                    task.execute(&context);
                }
                trace!("Background worker {name} has stopped");
            })
            .map_err(|error| ServerError::CannotStartWorker(self.name.clone(), error.to_string()))?;
        self.handle = Some(handle);
        Ok(())
    }

    pub fn schedule(&self, task: ReplTask) -> Result<(), ServerError> {
        self.sender
            .send(task)
            .map_err(|_| ServerError::CannotScheduleTask(self.name.clone()))
    }

    /// Signals the worker to stop and joins its thread. With the default
    /// `Drain` policy every task queued before the signal still runs.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.sender.send(ReplTask::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Background worker {} panicked", self.name);
            }
        }
    }
}

impl Drop for ReplBgWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
