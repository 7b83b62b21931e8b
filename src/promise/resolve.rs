//! The resolution procedure and handler dispatch.
//!
//! Settling is driven by three entry points: [`run_initializer`] (mints the
//! one-shot guard and runs an initializer), [`fulfill`] (the full resolution
//! procedure), and [`reject`] (stores the reason as-is). Both terminal paths
//! end in a flush that drains the handler queue exactly once; each drained
//! handler is dispatched as a scheduled job, never inline.

use super::core::{Handler, Promise, Resolver, State};
use crate::error::PromiseError;
use crate::scheduler::context;
use crate::value::Value;

use std::rc::Rc;

use tracing::trace;

/// Runs `init` against a freshly minted one-shot settle guard.
///
/// Only the first of a fulfill attempt, a reject attempt, or an `Err`
/// returned by `init` has effect; everything later is ignored.
pub(crate) fn run_initializer<F>(promise: &Promise, init: F)
where
    F: FnOnce(&Resolver) -> Result<(), Value>,
{
    let resolver = Resolver::new(promise);

    if let Err(reason) = init(&resolver) {
        resolver.reject(reason);
    }
}

/// The resolution procedure.
///
/// Plain values settle directly. A native promise becomes an alias target:
/// the outer promise defers to it transitively. A foreign thenable is probed
/// and then re-enters the procedure with its own hook as the driving
/// initializer.
pub(crate) fn fulfill(promise: &Promise, value: Value) {
    if let Value::Promise(ref inner) = value {
        if promise.ptr_eq(inner) {
            reject(promise, Value::error(PromiseError::SelfResolution));
            return;
        }

        // Own type with the standard hook: adopt as an already-settled
        // alias. Handler enlistment follows the chain to the live end.
        settle(promise, State::Fulfilled, value);
        return;
    }

    if let Value::Thenable(ref thenable) = value {
        let thenable = Rc::clone(thenable);

        // The probe models a hook read that may itself fail.
        if let Err(reason) = thenable.lookup() {
            reject(promise, reason);
            return;
        }

        run_initializer(promise, move |resolver| {
            let (on_fulfilled, on_rejected) = resolver.settle_fns();
            thenable.then(on_fulfilled, on_rejected)
        });
        return;
    }

    settle(promise, State::Fulfilled, value);
}

/// Rejects with `reason`, stored as-is: rejection reasons are never
/// unwrapped, even when they are promises themselves.
pub(crate) fn reject(promise: &Promise, reason: Value) {
    settle(promise, State::Rejected, reason);
}

fn settle(promise: &Promise, state: State, value: Value) {
    {
        let mut inner = promise.inner.borrow_mut();

        debug_assert_eq!(
            inner.state,
            State::Pending,
            "a promise settles at most once"
        );

        inner.state = state;
        inner.value = Some(value);
    }

    trace!(state = ?state, "promise settled");
    flush(promise);
}

/// Drains the handler queue, exactly once, at the moment of settling.
///
/// Handlers are re-enlisted rather than dispatched directly: the settle may
/// have installed an alias, in which case they belong on the target.
fn flush(promise: &Promise) {
    let handlers: Vec<Handler> = std::mem::take(&mut promise.inner.borrow_mut().queue);

    if !handlers.is_empty() {
        trace!(handlers = handlers.len(), "flushing handler queue");
    }

    for handler in handlers {
        enlist(promise.clone(), handler);
    }
}

/// Walks an alias chain to the deepest live promise.
///
/// An explicit loop rather than recursion: alias chains are unbounded, and
/// each link substitutes "the promise currently being awaited".
pub(crate) fn follow_aliases(mut promise: Promise) -> Promise {
    loop {
        let next = {
            let inner = promise.inner.borrow();

            match (inner.state, inner.value.as_ref()) {
                (State::Fulfilled, Some(Value::Promise(target))) => target.clone(),
                _ => break,
            }
        };

        promise = next;
    }

    promise
}

/// Routes one handler registration: queued while the source is pending,
/// dispatched on a later turn once it is terminal.
pub(crate) fn enlist(promise: Promise, handler: Handler) {
    let promise = follow_aliases(promise);
    let pending = promise.inner.borrow().state == State::Pending;

    if pending {
        promise.inner.borrow_mut().queue.push(handler);
    } else {
        dispatch(&promise, handler);
    }
}

/// Schedules one handler against a terminal promise.
///
/// Dispatch is always asynchronous, even when the source was already
/// terminal at registration time, so a continuation can never observe its
/// callback firing before the current synchronous block finishes.
fn dispatch(source: &Promise, handler: Handler) {
    let (state, value) = {
        let inner = source.inner.borrow();
        (inner.state, inner.value.clone())
    };

    // Only terminal promises reach dispatch, so the settled slot is filled.
    let Some(value) = value else { return };

    context::schedule(Box::new(move || {
        let Handler {
            target,
            on_fulfilled,
            on_rejected,
        } = handler;

        let callback = match state {
            State::Fulfilled => on_fulfilled,
            State::Rejected => on_rejected,
            State::Pending => None,
        };

        match callback {
            // No matching arm: propagate the outcome unchanged. This is what
            // makes `catch` transparent to fulfillment and lets a rejection
            // travel past plain `then` links.
            None => match state {
                State::Rejected => reject(&target, value),
                _ => fulfill(&target, value),
            },

            Some(callback) => match callback(value) {
                Ok(next) => fulfill(&target, next),
                Err(reason) => reject(&target, reason),
            },
        }
    }));
}
