use super::resolve;
use crate::value::{Settle, Value};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// The lifecycle state of a promise.
///
/// The state is monotonic: once it leaves `Pending` it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

/// A continuation callback.
///
/// Returning `Ok` fulfills the continuation promise with the returned value
/// (subject to the resolution procedure, so returning another promise or
/// thenable chains correctly); returning `Err` rejects it.
pub type Callback = Box<dyn FnOnce(Value) -> Result<Value, Value>>;

/// One handler registration, produced by every `then`-family call.
///
/// Owns the continuation promise it will settle and up to two optional
/// callbacks; a missing callback propagates the source outcome unchanged.
pub(crate) struct Handler {
    pub(crate) target: Promise,
    pub(crate) on_fulfilled: Option<Callback>,
    pub(crate) on_rejected: Option<Callback>,
}

pub(crate) struct Inner {
    pub(crate) state: State,

    /// The settled slot: fulfillment value or rejection reason, present only
    /// once terminal. When a promise is fulfilled with another promise this
    /// holds the alias target instead of a plain value.
    pub(crate) value: Option<Value>,

    /// Handlers registered while pending, drained exactly once at settle
    /// time.
    pub(crate) queue: Vec<Handler>,
}

/// A single-assignment container for a value or failure that will exist at
/// a future point.
///
/// `Promise` is a cheap-clone handle; all clones observe the same state. The
/// model is strictly single-threaded cooperative, so the handle is
/// deliberately not `Send`: "concurrency" here means interleaving of
/// scheduled turns on one thread, never parallel execution.
///
/// # Examples
///
/// ```rust
/// use promitto::{Promise, TurnQueue, Value};
///
/// let queue = TurnQueue::new();
/// let _guard = queue.enter();
///
/// let greeting = Promise::new(|resolver| {
///     resolver.fulfill("hello");
///     Ok(())
/// });
///
/// let loud = greeting.then(|value| match value {
///     Value::Text(text) => Ok(Value::from(text.to_uppercase())),
///     other => Ok(other),
/// });
///
/// queue.run_until_idle();
/// assert_eq!(loud.settled(), Some(Value::from("HELLO")));
/// ```
#[derive(Clone)]
pub struct Promise {
    pub(crate) inner: Rc<RefCell<Inner>>,
}

impl Promise {
    /// Constructs a promise and synchronously invokes `init` with its settle
    /// capability.
    ///
    /// `init` may settle the promise immediately or hand the [`Resolver`] to
    /// a later scheduled turn. Returning `Err` from `init` rejects the
    /// promise with the returned reason, unless it already settled; only the
    /// first settle attempt has effect.
    pub fn new<F>(init: F) -> Self
    where
        F: FnOnce(&Resolver) -> Result<(), Value>,
    {
        let promise = Self::pending();
        resolve::run_initializer(&promise, init);
        promise
    }

    /// Creates a promise together with its settle capability.
    ///
    /// Useful when the settling side lives elsewhere than the construction
    /// site.
    pub fn with_resolvers() -> (Self, Resolver) {
        let promise = Self::pending();
        let resolver = Resolver::new(&promise);
        (promise, resolver)
    }

    /// Creates a promise already fulfilled with `value`.
    ///
    /// Passing a promise or thenable defers resolution to it, per the
    /// resolution procedure.
    pub fn resolve(value: impl Into<Value>) -> Self {
        let value = value.into();

        Self::new(move |resolver| {
            resolver.fulfill(value);
            Ok(())
        })
    }

    /// Creates a promise already rejected with `reason`.
    ///
    /// Rejection reasons are never unwrapped, even when they are promises
    /// themselves.
    pub fn reject(reason: impl Into<Value>) -> Self {
        let reason = reason.into();

        Self::new(move |resolver| {
            resolver.reject(reason);
            Ok(())
        })
    }

    pub(crate) fn pending() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: State::Pending,
                value: None,
                queue: Vec::new(),
            })),
        }
    }

    /// Registers a fulfillment continuation; rejections pass through to the
    /// returned promise unchanged.
    ///
    /// Always allocates and returns the continuation promise immediately.
    /// The callback never runs in the current synchronous block, even when
    /// this promise is already settled.
    pub fn then<F>(&self, on_fulfilled: F) -> Promise
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        self.subscribe(Some(Box::new(on_fulfilled)), None)
    }

    /// Registers a rejection continuation; fulfillments pass through to the
    /// returned promise unchanged.
    pub fn catch<R>(&self, on_rejected: R) -> Promise
    where
        R: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        self.subscribe(None, Some(Box::new(on_rejected)))
    }

    /// Registers both continuation arms at once.
    pub fn then_catch<F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
        R: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        self.subscribe(Some(Box::new(on_fulfilled)), Some(Box::new(on_rejected)))
    }

    /// Runs `on_finally` once this promise settles, regardless of outcome,
    /// and passes the original outcome through unchanged.
    ///
    /// `on_finally` receives no arguments. If it returns `Err`, that failure
    /// supersedes the original outcome and rejects the returned promise.
    pub fn finally<F>(&self, on_finally: F) -> Promise
    where
        F: FnOnce() -> Result<(), Value> + 'static,
    {
        // Exactly one of the two arms ever runs, but each needs to be able
        // to consume the hook.
        let hook = Rc::new(RefCell::new(Some(on_finally)));
        let rejected_hook = hook.clone();

        self.subscribe(
            Some(Box::new(move |value| {
                if let Some(on_finally) = hook.borrow_mut().take() {
                    on_finally()?;
                }
                Ok(value)
            })),
            Some(Box::new(move |reason| {
                if let Some(on_finally) = rejected_hook.borrow_mut().take() {
                    on_finally()?;
                }
                Err(reason)
            })),
        )
    }

    /// Registers a raw handler pair and returns its continuation promise.
    pub(crate) fn subscribe(
        &self,
        on_fulfilled: Option<Callback>,
        on_rejected: Option<Callback>,
    ) -> Promise {
        let target = Promise::pending();

        resolve::enlist(
            self.clone(),
            Handler {
                target: target.clone(),
                on_fulfilled,
                on_rejected,
            },
        );

        target
    }

    /// Reports the current state, following alias chains: a promise
    /// fulfilled with another promise is still `Pending` until the inner one
    /// settles, and then reports the inner outcome.
    pub fn state(&self) -> State {
        let deepest = resolve::follow_aliases(self.clone());
        let inner = deepest.inner.borrow();
        inner.state
    }

    /// Returns the settled value or rejection reason, or `None` while still
    /// pending. Follows alias chains like [`state`](Self::state).
    pub fn settled(&self) -> Option<Value> {
        let deepest = resolve::follow_aliases(self.clone());
        let inner = deepest.inner.borrow();

        match inner.state {
            State::Pending => None,
            State::Fulfilled | State::Rejected => inner.value.clone(),
        }
    }

    /// Whether `other` is a handle to this same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();

        f.debug_struct("Promise")
            .field("state", &inner.state)
            .field("queued", &inner.queue.len())
            .finish()
    }
}

/// The settle capability of one promise.
///
/// A `Resolver` fuses the two construction capabilities (settle-fulfilled
/// and settle-rejected) into one cloneable handle carrying a one-shot guard:
/// only the first settle attempt through any clone has effect, every later
/// one is a no-op. A fresh guard is minted per initializer invocation, so a
/// thenable re-resolution of the same promise gets its own.
#[derive(Clone)]
pub struct Resolver {
    target: Promise,
    used: Rc<Cell<bool>>,
}

impl Resolver {
    pub(crate) fn new(target: &Promise) -> Self {
        Self {
            target: target.clone(),
            used: Rc::new(Cell::new(false)),
        }
    }

    /// Fulfills the promise with `value`, subject to the resolution
    /// procedure. A no-op once any settle attempt was made.
    pub fn fulfill(&self, value: impl Into<Value>) {
        if !self.used.replace(true) {
            resolve::fulfill(&self.target, value.into());
        }
    }

    /// Rejects the promise with `reason`. A no-op once any settle attempt
    /// was made.
    pub fn reject(&self, reason: impl Into<Value>) {
        if !self.used.replace(true) {
            resolve::reject(&self.target, reason.into());
        }
    }

    /// Boxes this capability into the pair of consumable settle functions
    /// handed to a foreign thenable.
    pub(crate) fn settle_fns(&self) -> (Settle, Settle) {
        let fulfill = {
            let resolver = self.clone();
            Box::new(move |value: Value| resolver.fulfill(value))
        };
        let reject = {
            let resolver = self.clone();
            Box::new(move |reason: Value| resolver.reject(reason))
        };

        (fulfill, reject)
    }
}
