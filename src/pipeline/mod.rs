//! Deferred-computation primitive with explicit thread affinity.
//!
//! A [`TaskSystem`] owns two execution contexts: a single orchestration
//! thread, where results are finalized and shared state is mutated, and a
//! pool of worker threads for CPU-bound decode work. A [`Future`] is a
//! handle to a value that becomes available asynchronously; continuations
//! attach with an [`Affinity`] choosing which context they run on.
//!
//! # Guarantees
//!
//! - A future resolves at most once; its continuation observes the value
//!   exactly once.
//! - Sibling continuations of a fan-out have no relative ordering; only
//!   [`TaskSystem::join_all`] observes all of them, after every one has
//!   resolved.
//! - Joins use a countdown latch fired by whichever input resolves last.
//!   No thread is parked in a polling loop while a join is pending.
//!
//! There is no cancellation and no timeout; callers wanting bounded latency
//! impose it above this layer.

mod future;
mod pool;

pub use future::Future;
pub use pool::{Affinity, TaskSystem};
