//! Orchestration thread and worker pool.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::trace;

/// A scheduled unit of work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Which execution context a continuation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// The single orchestration thread. Shared structures (result lists,
    /// merged models) are only touched from here, so they need no locks.
    Orchestrator,
    /// Any thread of the worker pool. For CPU-bound work that touches no
    /// shared state.
    Worker,
}

/// Task system owning the orchestration thread and the worker pool.
///
/// Cloning is cheap; all clones schedule onto the same threads. Threads shut
/// down when the last clone (and the last outstanding [`Future`]) is
/// dropped.
///
/// [`Future`]: super::Future
#[derive(Clone)]
pub struct TaskSystem {
    inner: Arc<Inner>,
}

struct Inner {
    orchestrator: Mutex<Sender<Job>>,
    workers: Mutex<Sender<Job>>,
}

impl TaskSystem {
    /// Creates a task system with the given number of worker threads.
    pub fn new(worker_threads: usize) -> Self {
        let (orchestrator_tx, orchestrator_rx) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("ts-orchestrator".to_string())
            .spawn(move || run_serial(orchestrator_rx))
            .expect("failed to spawn orchestration thread");

        let (worker_tx, worker_rx) = mpsc::channel::<Job>();
        let worker_rx = Arc::new(Mutex::new(worker_rx));
        for index in 0..worker_threads.max(1) {
            let rx = Arc::clone(&worker_rx);
            thread::Builder::new()
                .name(format!("ts-worker-{}", index))
                .spawn(move || run_pooled(rx))
                .expect("failed to spawn worker thread");
        }

        Self {
            inner: Arc::new(Inner {
                orchestrator: Mutex::new(orchestrator_tx),
                workers: Mutex::new(worker_tx),
            }),
        }
    }

    /// Schedules a job on the requested execution context.
    pub(crate) fn schedule(&self, affinity: Affinity, job: Job) {
        let sender = match affinity {
            Affinity::Orchestrator => &self.inner.orchestrator,
            Affinity::Worker => &self.inner.workers,
        };
        sender
            .lock()
            .expect("task queue sender poisoned")
            .send(job)
            .expect("task system threads stopped unexpectedly");
    }
}

impl Default for TaskSystem {
    /// Creates a task system sized to the machine's available parallelism.
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(workers)
    }
}

/// Runs jobs from a channel owned by a single thread until it disconnects.
fn run_serial(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        job();
    }
    trace!("orchestration thread exiting");
}

/// Runs jobs from a channel shared by the worker pool until it disconnects.
fn run_pooled(rx: Arc<Mutex<Receiver<Job>>>) {
    loop {
        // Hold the lock only for the receive, not while running the job.
        let job = {
            let rx = rx.lock().expect("worker queue poisoned");
            rx.recv()
        };
        match job {
            Ok(job) => job(),
            Err(_) => break,
        }
    }
    trace!("worker thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::channel;

    #[test]
    fn test_schedule_runs_on_named_orchestrator_thread() {
        let system = TaskSystem::new(2);
        let (tx, rx) = channel();
        system.schedule(
            Affinity::Orchestrator,
            Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send(name).expect("test channel closed");
            }),
        );
        let name = rx.recv().expect("job never ran");
        assert_eq!(name.as_deref(), Some("ts-orchestrator"));
    }

    #[test]
    fn test_schedule_runs_on_worker_thread() {
        let system = TaskSystem::new(2);
        let (tx, rx) = channel();
        system.schedule(
            Affinity::Worker,
            Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send(name).expect("test channel closed");
            }),
        );
        let name = rx.recv().expect("job never ran").unwrap_or_default();
        assert!(name.starts_with("ts-worker-"), "ran on {}", name);
    }

    #[test]
    fn test_orchestrator_jobs_run_in_submission_order() {
        let system = TaskSystem::new(1);
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = channel();
        for expected in 0..16 {
            let counter = Arc::clone(&counter);
            let tx = tx.clone();
            system.schedule(
                Affinity::Orchestrator,
                Box::new(move || {
                    let seen = counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(seen, expected);
                    if expected == 15 {
                        tx.send(()).expect("test channel closed");
                    }
                }),
            );
        }
        rx.recv().expect("jobs never finished");
    }
}
