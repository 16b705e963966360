//! Futures, continuations, and the join combinator.

use super::pool::{Affinity, TaskSystem};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

type Continuation<T> = Box<dyn FnOnce(T) + Send + 'static>;

enum Slot<T> {
    /// Not yet resolved, no continuation attached.
    Pending,
    /// Not yet resolved; this continuation runs at resolution.
    Waiting(Continuation<T>),
    /// Resolved before any continuation was attached.
    Resolved(T),
    /// The value has been handed to a continuation or a waiter.
    Consumed,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// Resolves a future's shared state, running the continuation if one is
/// already attached. Resolution happens at most once by construction; the
/// continuation runs inline on the resolving thread and is responsible for
/// its own scheduling.
fn resolve<T>(shared: &Shared<T>, value: T) {
    let action = {
        let mut slot = shared.slot.lock().expect("future state poisoned");
        match std::mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Pending => {
                *slot = Slot::Resolved(value);
                shared.ready.notify_all();
                None
            }
            Slot::Waiting(continuation) => Some((continuation, value)),
            other => {
                *slot = other;
                debug_assert!(false, "future resolved more than once");
                None
            }
        }
    };
    if let Some((continuation, value)) = action {
        continuation(value);
    }
}

/// A handle to a value of type `T` becoming available asynchronously.
///
/// The handle is owned uniquely by its creator until consumed by a
/// continuation ([`Future::then`]) or a blocking wait ([`Future::wait`]);
/// either way the value is observed exactly once.
pub struct Future<T> {
    shared: Arc<Shared<T>>,
    system: TaskSystem,
}

impl<T: Send + 'static> Future<T> {
    fn pending(system: TaskSystem) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Pending),
                ready: Condvar::new(),
            }),
            system,
        }
    }

    /// Attaches a continuation that runs inline on whichever thread
    /// resolves this future. Used by the combinators; everything public
    /// goes through [`Future::then`] so the affinity is always explicit.
    fn on_resolve(self, continuation: impl FnOnce(T) + Send + 'static) {
        let mut continuation = Some(Box::new(continuation) as Continuation<T>);
        let ready_value = {
            let mut slot = self.shared.slot.lock().expect("future state poisoned");
            match std::mem::replace(&mut *slot, Slot::Consumed) {
                Slot::Pending => {
                    let continuation =
                        continuation.take().expect("continuation already consumed");
                    *slot = Slot::Waiting(continuation);
                    None
                }
                Slot::Resolved(value) => Some(value),
                other => {
                    *slot = other;
                    debug_assert!(false, "future consumed more than once");
                    None
                }
            }
        };
        if let Some(value) = ready_value {
            if let Some(continuation) = continuation.take() {
                continuation(value);
            }
        }
    }

    /// Attaches a continuation with an explicit execution context, returning
    /// a future for the continuation's result.
    pub fn then<U, F>(self, affinity: Affinity, f: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let system = self.system.clone();
        let out = Future::pending(system.clone());
        let out_shared = Arc::clone(&out.shared);
        self.on_resolve(move |value| {
            system.schedule(
                affinity,
                Box::new(move || resolve(&out_shared, f(value))),
            );
        });
        out
    }

    /// Shorthand for [`Future::then`] on the orchestration thread.
    pub fn then_on_orchestrator<U, F>(self, f: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(Affinity::Orchestrator, f)
    }

    /// Shorthand for [`Future::then`] on the worker pool.
    pub fn then_on_worker<U, F>(self, f: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(Affinity::Worker, f)
    }

    /// Blocks the calling thread until the future resolves and returns the
    /// value. For callers outside the task system (tests, top-level
    /// drivers); must not be called from the orchestration thread, where it
    /// would deadlock against the continuations it is waiting for.
    pub fn wait(self) -> T {
        let mut slot = self.shared.slot.lock().expect("future state poisoned");
        loop {
            match std::mem::replace(&mut *slot, Slot::Consumed) {
                Slot::Resolved(value) => return value,
                Slot::Pending => {
                    *slot = Slot::Pending;
                    slot = self
                        .shared
                        .ready
                        .wait(slot)
                        .expect("future state poisoned");
                }
                _ => unreachable!("future waited on after being consumed"),
            }
        }
    }
}

impl TaskSystem {
    /// Creates an already-completed future carrying `value`.
    pub fn resolved<T: Send + 'static>(&self, value: T) -> Future<T> {
        let out = Future::pending(self.clone());
        resolve(&out.shared, value);
        out
    }

    /// Schedules `f` for background execution on the worker pool and
    /// returns a future for its result.
    pub fn run_on_worker<T, F>(&self, f: F) -> Future<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let out = Future::pending(self.clone());
        let shared = Arc::clone(&out.shared);
        self.schedule(Affinity::Worker, Box::new(move || resolve(&shared, f())));
        out
    }

    /// Joins a fan-out: the returned future resolves exactly once, after
    /// every input has resolved, carrying the results in input order.
    ///
    /// The join is a countdown latch decremented as each input resolves;
    /// the input that resolves last fires the join continuation. No thread
    /// blocks or polls while the join is pending.
    pub fn join_all<T: Send + 'static>(&self, futures: Vec<Future<T>>) -> Future<Vec<T>> {
        if futures.is_empty() {
            return self.resolved(Vec::new());
        }

        let out = Future::pending(self.clone());
        let out_shared = Arc::clone(&out.shared);
        let count = futures.len();
        let results: Arc<Mutex<Vec<Option<T>>>> =
            Arc::new(Mutex::new((0..count).map(|_| None).collect()));
        let remaining = Arc::new(AtomicUsize::new(count));

        for (index, future) in futures.into_iter().enumerate() {
            let results = Arc::clone(&results);
            let remaining = Arc::clone(&remaining);
            let out_shared = Arc::clone(&out_shared);
            future.on_resolve(move |value| {
                {
                    let mut slots = results.lock().expect("join results poisoned");
                    slots[index] = Some(value);
                }
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let mut slots = results.lock().expect("join results poisoned");
                    let collected = slots
                        .iter_mut()
                        .map(|slot| slot.take().expect("joined future missing its result"))
                        .collect();
                    resolve(&out_shared, collected);
                }
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_resolved_future_yields_value() {
        let system = TaskSystem::new(2);
        assert_eq!(system.resolved(42).wait(), 42);
    }

    #[test]
    fn test_then_chains_across_contexts() {
        let system = TaskSystem::new(2);
        let value = system
            .resolved(2)
            .then(Affinity::Worker, |v| v * 10)
            .then(Affinity::Orchestrator, |v| v + 1)
            .wait();
        assert_eq!(value, 21);
    }

    #[test]
    fn test_then_runs_on_requested_thread() {
        let system = TaskSystem::new(2);
        let name = system
            .resolved(())
            .then(Affinity::Orchestrator, |_| {
                thread::current().name().map(str::to_string)
            })
            .wait();
        assert_eq!(name.as_deref(), Some("ts-orchestrator"));

        let name = system
            .resolved(())
            .then(Affinity::Worker, |_| {
                thread::current().name().map(str::to_string)
            })
            .wait()
            .unwrap_or_default();
        assert!(name.starts_with("ts-worker-"), "ran on {}", name);
    }

    #[test]
    fn test_run_on_worker_returns_result() {
        let system = TaskSystem::new(2);
        let value = system.run_on_worker(|| "decoded".to_string()).wait();
        assert_eq!(value, "decoded");
    }

    #[test]
    fn test_continuation_attached_after_resolution_still_runs() {
        let system = TaskSystem::new(2);
        let future = system.run_on_worker(|| 7);
        // Give the worker a chance to resolve before the continuation
        // attaches, covering the resolved-then-then path.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(future.then_on_orchestrator(|v| v + 1).wait(), 8);
    }

    #[test]
    fn test_join_all_preserves_input_order() {
        let system = TaskSystem::new(4);
        let futures: Vec<_> = (0..8u64)
            .map(|i| {
                system.run_on_worker(move || {
                    // Later inputs finish first; the join must still report
                    // results in input order.
                    thread::sleep(Duration::from_millis(40 - i * 5));
                    i
                })
            })
            .collect();
        let results = system.join_all(futures).wait();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_join_all_empty_resolves_immediately() {
        let system = TaskSystem::new(2);
        let results: Vec<u32> = system.join_all(Vec::new()).wait();
        assert!(results.is_empty());
    }

    #[test]
    fn test_join_all_mixed_resolved_and_pending() {
        let system = TaskSystem::new(2);
        let futures = vec![
            system.resolved(1),
            system.run_on_worker(|| 2),
            system.resolved(3),
        ];
        assert_eq!(system.join_all(futures).wait(), vec![1, 2, 3]);
    }

    #[test]
    fn test_join_then_merge_on_orchestrator() {
        let system = TaskSystem::new(4);
        let futures: Vec<_> = (1..=5).map(|i| system.run_on_worker(move || i)).collect();
        let sum = system
            .join_all(futures)
            .then_on_orchestrator(|values: Vec<i32>| values.iter().sum::<i32>())
            .wait();
        assert_eq!(sum, 15);
    }
}
