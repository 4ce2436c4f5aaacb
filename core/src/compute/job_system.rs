use parking_lot::Mutex;

type Job<'env> = Box<dyn FnOnce() + Send + 'env>;

/// A worker pool that executes batches of jobs behind a join point.
///
/// Jobs are collected inside [`JobSystem::scope`] and handed to at most
/// `thread_count()` scoped worker threads once the closure returns. The call
/// returns only after every job of the scope has finished, so the scope acts
/// as the parent job all of its children join on. Jobs can borrow local
/// variables thanks to scoped lifetimes.
///
/// [`JobScope::run_and_wait`] runs a job synchronously on the calling thread
/// before anything else of the scope is dispatched, which is how callers
/// serialise work that must not race with the rest of the batch.
///
/// # Example
///
/// ```
/// use matforge_core::compute::JobSystem;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let jobs = JobSystem::new(4);
/// let counter = AtomicU32::new(0);
///
/// jobs.scope(|s| {
///     s.run_and_wait(|| {
///         counter.fetch_add(100, Ordering::Relaxed);
///     });
///     for _ in 0..8 {
///         s.spawn(|| {
///             counter.fetch_add(1, Ordering::Relaxed);
///         });
///     }
/// });
/// assert_eq!(counter.load(Ordering::Relaxed), 108);
/// ```
#[derive(Debug, Clone)]
pub struct JobSystem {
    num_threads: usize,
}

impl JobSystem {
    /// Creates a job system with the given number of worker threads.
    ///
    /// A count of zero is clamped to one. With a single worker every job runs
    /// on the calling thread.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Creates a job system sized to the number of available CPU cores.
    pub fn default_threads() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    /// Number of worker threads used to drain a scope.
    pub fn thread_count(&self) -> usize {
        self.num_threads
    }

    /// Collects jobs within a scoped context and runs them to completion.
    ///
    /// All jobs spawned within the closure are guaranteed to complete before
    /// this method returns.
    pub fn scope<'env, F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut JobScope<'env>) -> R,
    {
        let mut scope = JobScope { jobs: Vec::new() };
        let result = f(&mut scope);
        self.dispatch(scope.jobs);
        result
    }

    fn dispatch(&self, jobs: Vec<Job<'_>>) {
        let workers = self.num_threads.min(jobs.len());
        if workers <= 1 {
            for job in jobs {
                job();
            }
            return;
        }

        log::trace!("dispatching {} jobs to {} workers", jobs.len(), workers);

        let queue = Mutex::new(jobs.into_iter());
        std::thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|| {
                    loop {
                        let next = queue.lock().next();
                        match next {
                            Some(job) => job(),
                            None => break,
                        }
                    }
                });
            }
        });
    }
}

impl Default for JobSystem {
    fn default() -> Self {
        Self::default_threads()
    }
}

/// A batch of jobs that must complete before [`JobSystem::scope`] returns.
pub struct JobScope<'env> {
    jobs: Vec<Job<'env>>,
}

impl<'env> JobScope<'env> {
    /// Queues a job for concurrent execution once the scope closure returns.
    pub fn spawn<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'env,
    {
        self.jobs.push(Box::new(f));
    }

    /// Runs a job immediately on the calling thread.
    ///
    /// Nothing queued in this scope has started yet when the job runs.
    pub fn run_and_wait<F>(&mut self, f: F)
    where
        F: FnOnce(),
    {
        f();
    }

    /// Number of jobs queued so far.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if no job has been queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    #[test]
    fn scope_runs_single_job() {
        let jobs = JobSystem::new(2);
        let counter = AtomicU32::new(0);
        jobs.scope(|s| {
            s.spawn(|| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        });
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn scope_runs_many_jobs() {
        let jobs = JobSystem::new(4);
        let counter = AtomicU32::new(0);
        jobs.scope(|s| {
            for _ in 0..100 {
                s.spawn(|| {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
        });
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn scope_captures_references() {
        let jobs = JobSystem::new(2);
        let mut value = 0u32;
        jobs.scope(|s| {
            s.spawn(|| {
                value = 42;
            });
        });
        assert_eq!(value, 42);
    }

    #[test]
    fn run_and_wait_finishes_before_queued_jobs_start() {
        let jobs = JobSystem::new(4);
        let order = AtomicUsize::new(0);
        let first_seen = AtomicUsize::new(usize::MAX);
        let later_seen = Mutex::new(Vec::new());

        jobs.scope(|s| {
            s.run_and_wait(|| {
                first_seen.store(order.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            });
            for _ in 0..16 {
                s.spawn(|| {
                    later_seen.lock().push(order.fetch_add(1, Ordering::SeqCst));
                });
            }
        });

        assert_eq!(first_seen.load(Ordering::SeqCst), 0);
        assert!(later_seen.lock().iter().all(|&n| n > 0));
        assert_eq!(later_seen.lock().len(), 16);
    }

    #[test]
    fn scope_returns_closure_result() {
        let jobs = JobSystem::new(2);
        let queued = jobs.scope(|s| {
            s.spawn(|| {});
            s.spawn(|| {});
            s.len()
        });
        assert_eq!(queued, 2);
    }

    #[test]
    fn zero_threads_clamped_to_one() {
        let jobs = JobSystem::new(0);
        assert_eq!(jobs.thread_count(), 1);
    }

    #[test]
    fn default_threads_at_least_one() {
        let jobs = JobSystem::default_threads();
        assert!(jobs.thread_count() >= 1);
    }
}
