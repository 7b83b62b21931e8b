use super::context::{self, SchedulerGuard};
use super::{Job, Schedule};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

/// A single-threaded FIFO turn queue.
///
/// `TurnQueue` is the default [`Schedule`] implementation: jobs are appended
/// in submission order and drained one turn at a time. Handles are cheap to
/// clone and share the same queue.
///
/// # Examples
///
/// ```rust
/// use promitto::{Promise, TurnQueue};
///
/// let queue = TurnQueue::new();
/// let _guard = queue.enter();
///
/// let settled = Promise::resolve(1).then(Ok);
///
/// queue.run_until_idle();
/// assert!(settled.settled().is_some());
/// ```
#[derive(Clone, Default)]
pub struct TurnQueue {
    jobs: Rc<RefCell<VecDeque<Job>>>,
}

impl TurnQueue {
    /// Creates an empty turn queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs this queue as the current scheduler for this thread.
    ///
    /// The previous scheduler is restored when the guard is dropped.
    pub fn enter(&self) -> SchedulerGuard {
        context::enter(Rc::new(self.clone()))
    }

    /// Runs queued jobs until the queue is empty, including jobs scheduled
    /// by the jobs themselves while draining.
    ///
    /// Returns the number of jobs executed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;

        while self.tick() {
            ran += 1;
        }

        trace!(jobs = ran, "turn queue drained");
        ran
    }

    /// Runs the next queued job, if any.
    ///
    /// Returns `false` when the queue was idle.
    pub fn tick(&self) -> bool {
        // The borrow must end before the job runs: a job is free to schedule
        // more work on this same queue.
        let job = self.jobs.borrow_mut().pop_front();

        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Number of jobs currently queued.
    pub fn len(&self) -> usize {
        self.jobs.borrow().len()
    }

    /// Whether no jobs are currently queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.borrow().is_empty()
    }
}

impl Schedule for TurnQueue {
    fn schedule(&self, job: Job) {
        self.jobs.borrow_mut().push_back(job);
    }
}
