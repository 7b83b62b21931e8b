//! The dynamic value model carried through the state machine.
//!
//! A promise may be settled with a plain value, with another promise of
//! arbitrary nesting depth, or with a foreign [`Thenable`]. The settled slot
//! is therefore a dynamic [`Value`] rather than a type parameter; aggregates
//! are `Rc`-backed so values stay cheap to clone through handler dispatch.

use crate::error::PromiseError;
use crate::promise::Promise;

use std::fmt;
use std::rc::Rc;

/// A settle capability handed to a foreign thenable: invoking it fulfills or
/// rejects the promise currently being resolved. Consumed on use; only the
/// first capability invoked per resolution has effect.
pub type Settle = Box<dyn FnOnce(Value)>;

/// Capability interface for foreign deferred values.
///
/// Any value exposing a resolution hook of this signature is accepted as a
/// resolution source, regardless of its origin. The native [`Promise`] type
/// is one conforming variant among possibly many; implementing this trait is
/// how another deferred implementation interoperates with this one.
pub trait Thenable: fmt::Debug {
    /// Probes for the resolution hook before it is driven.
    ///
    /// Mirrors a property read that may itself fail: an `Err` poisons the
    /// resolution with the returned reason instead of driving it.
    fn lookup(&self) -> Result<(), Value> {
        Ok(())
    }

    /// Drives resolution by invoking at most one of the two capabilities,
    /// now or from a later scheduled turn.
    ///
    /// Returning `Err` synchronously rejects the resolving promise, unless a
    /// capability was already invoked.
    fn then(&self, on_fulfilled: Settle, on_rejected: Settle) -> Result<(), Value>;
}

/// Whether a settlement ended in fulfillment or rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Fulfilled,
    Rejected,
}

/// One settlement record, as produced by
/// [`Promise::all_settled`](crate::Promise::all_settled).
///
/// The `value` slot holds either the fulfillment value or the rejection
/// reason; `status` disambiguates, mirroring the settled slot of the state
/// machine itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: Status,
    pub value: Value,
}

impl Outcome {
    pub fn fulfilled(value: Value) -> Self {
        Self {
            status: Status::Fulfilled,
            value,
        }
    }

    pub fn rejected(reason: Value) -> Self {
        Self {
            status: Status::Rejected,
            value: reason,
        }
    }
}

/// A value a promise can be settled with.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Rc<str>),
    List(Rc<[Value]>),
    /// A failure produced by the machinery itself, carried as a rejection
    /// reason.
    Error(Rc<PromiseError>),
    /// A settlement record from `all_settled`.
    Outcome(Rc<Outcome>),
    /// A native deferred value. Fulfilling a promise with one of these defers
    /// resolution until the inner promise settles.
    Promise(Promise),
    /// A foreign deferred value driving resolution through its own hook.
    Thenable(Rc<dyn Thenable>),
}

impl Value {
    /// Builds a `Text` value from a string slice.
    pub fn text(text: &str) -> Self {
        Value::Text(Rc::from(text))
    }

    /// Builds a `List` value from its items.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::from(items))
    }

    /// Builds an `Error` value from a machinery failure.
    pub fn error(error: PromiseError) -> Self {
        Value::Error(Rc::new(error))
    }
}

impl PartialEq for Value {
    /// Structural equality for plain values; identity for deferred ones.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Outcome(a), Value::Outcome(b)) => a == b,
            (Value::Promise(a), Value::Promise(b)) => a.ptr_eq(b),
            (Value::Thenable(a), Value::Thenable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<PromiseError> for Value {
    fn from(error: PromiseError) -> Self {
        Value::error(error)
    }
}

impl From<Outcome> for Value {
    fn from(outcome: Outcome) -> Self {
        Value::Outcome(Rc::new(outcome))
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Promise(promise)
    }
}
