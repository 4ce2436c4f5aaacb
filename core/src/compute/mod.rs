//! Parallel job primitives.
//!
//! - [`JobSystem`] - Worker pool that drains batches of jobs behind a join point
//! - [`JobScope`] - Handle for queueing jobs (or running one synchronously) inside a batch
//! - [`CancellationToken`] - Shared flag used to stop cooperative jobs early
//! - [`Cancelled`] - Error produced when a job observes cancellation

mod cancellation;
mod job_system;

pub use cancellation::{CancellationToken, Cancelled};
pub use job_system::{JobScope, JobSystem};
