use super::{Job, Schedule};

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Thread-local handle to the current scheduler.
    ///
    /// This is set when entering a scheduler context and allows the promise
    /// core to dispatch continuations without explicit parameter passing.
    static CURRENT_SCHEDULER: RefCell<Option<Rc<dyn Schedule>>> =
        const { RefCell::new(None) };
}

/// Hands a job to the current scheduler.
///
/// # Panics
///
/// Panics if called outside a scheduler context.
pub(crate) fn schedule(job: Job) {
    CURRENT_SCHEDULER.with(|cell| {
        let binding = cell.borrow();
        let scheduler = binding.as_ref().expect("no scheduler in context");

        scheduler.schedule(job);
    });
}

/// Installs `scheduler` as the current one for this thread.
///
/// The previous scheduler, if any, is restored when the returned guard is
/// dropped, so contexts nest.
pub(crate) fn enter(scheduler: Rc<dyn Schedule>) -> SchedulerGuard {
    CURRENT_SCHEDULER.with(|cell| SchedulerGuard {
        previous: cell.replace(Some(scheduler)),
    })
}

/// Keeps a scheduler installed for the current thread.
///
/// Returned by [`TurnQueue::enter`](super::TurnQueue::enter); dropping it
/// restores whatever scheduler was current before.
pub struct SchedulerGuard {
    previous: Option<Rc<dyn Schedule>>,
}

impl Drop for SchedulerGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();

        CURRENT_SCHEDULER.with(|cell| {
            cell.replace(previous);
        });
    }
}
