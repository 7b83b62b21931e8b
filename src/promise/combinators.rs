//! Completion policies over ordered sequences of awaitables.
//!
//! Each combinator normalizes its inputs through [`Promise::resolve`] (a
//! plain value is treated as an already-fulfilled promise), attaches exactly
//! one handler pair per input, and settles one derived promise. There is no
//! polling: the derived promise settles the moment enough inputs have.

use super::core::{Promise, Resolver};
use crate::error::PromiseError;
use crate::value::{Outcome, Value};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

impl Promise {
    /// Settles with the first input to settle, adopting its outcome.
    ///
    /// With no inputs the returned promise never settles: no input can ever
    /// win. This is the documented edge case, not specially handled.
    pub fn race<I>(inputs: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let (target, resolver) = Promise::with_resolvers();

        for input in inputs {
            let win = resolver.clone();
            let lose = resolver.clone();

            Promise::resolve(input).subscribe(
                Some(Box::new(move |value: Value| -> Result<Value, Value> {
                    win.fulfill(value);
                    Ok(Value::Unit)
                })),
                Some(Box::new(move |reason: Value| -> Result<Value, Value> {
                    lose.reject(reason);
                    Ok(Value::Unit)
                })),
            );
        }

        target
    }

    /// Fulfills with every input's value, in input order, once all have
    /// fulfilled; rejects with the first rejection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use promitto::{Promise, TurnQueue, Value};
    ///
    /// let queue = TurnQueue::new();
    /// let _guard = queue.enter();
    ///
    /// let gathered = Promise::all([
    ///     Value::from(1),
    ///     Value::from(Promise::resolve(2)),
    ///     Value::from(3),
    /// ]);
    ///
    /// queue.run_until_idle();
    /// assert_eq!(
    ///     gathered.settled(),
    ///     Some(Value::list(vec![1.into(), 2.into(), 3.into()])),
    /// );
    /// ```
    pub fn all<I>(inputs: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inputs: Vec<Value> = inputs.into_iter().map(Into::into).collect();
        let (target, resolver) = Promise::with_resolvers();

        let count = inputs.len();
        if count == 0 {
            resolver.fulfill(Value::list(Vec::new()));
            return target;
        }

        let values = Rc::new(RefCell::new(vec![Value::Unit; count]));
        let remaining = Rc::new(Cell::new(count));

        for (index, input) in inputs.into_iter().enumerate() {
            let gather = {
                let values = values.clone();
                let remaining = remaining.clone();
                let resolver = resolver.clone();

                move |value: Value| -> Result<Value, Value> {
                    values.borrow_mut()[index] = value;
                    remaining.set(remaining.get() - 1);

                    if remaining.get() == 0 {
                        resolver.fulfill(Value::list(values.borrow().clone()));
                    }
                    Ok(Value::Unit)
                }
            };

            let fail = {
                let resolver = resolver.clone();

                move |reason: Value| -> Result<Value, Value> {
                    resolver.reject(reason);
                    Ok(Value::Unit)
                }
            };

            Promise::resolve(input).subscribe(Some(Box::new(gather)), Some(Box::new(fail)));
        }

        target
    }

    /// Fulfills with the first input to fulfill; rejects only once every
    /// input has rejected, with an aggregate carrying all reasons in input
    /// order.
    ///
    /// With no inputs, rejects immediately with an empty aggregate: no
    /// success is possible.
    pub fn any<I>(inputs: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inputs: Vec<Value> = inputs.into_iter().map(Into::into).collect();
        let (target, resolver) = Promise::with_resolvers();

        let count = inputs.len();
        if count == 0 {
            resolver.reject(PromiseError::AllRejected(Vec::new()));
            return target;
        }

        let reasons = Rc::new(RefCell::new(vec![Value::Unit; count]));
        let remaining = Rc::new(Cell::new(count));

        for (index, input) in inputs.into_iter().enumerate() {
            let win = {
                let resolver = resolver.clone();

                move |value: Value| -> Result<Value, Value> {
                    resolver.fulfill(value);
                    Ok(Value::Unit)
                }
            };

            let gather = {
                let reasons = reasons.clone();
                let remaining = remaining.clone();
                let resolver = resolver.clone();

                move |reason: Value| -> Result<Value, Value> {
                    reasons.borrow_mut()[index] = reason;
                    remaining.set(remaining.get() - 1);

                    if remaining.get() == 0 {
                        let reasons = reasons.borrow().clone();
                        resolver.reject(PromiseError::AllRejected(reasons));
                    }
                    Ok(Value::Unit)
                }
            };

            Promise::resolve(input).subscribe(Some(Box::new(win)), Some(Box::new(gather)));
        }

        target
    }

    /// Fulfills once every input has settled either way, with one
    /// [`Outcome`] record per input, in input order. Never rejects.
    pub fn all_settled<I>(inputs: I) -> Promise
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inputs: Vec<Value> = inputs.into_iter().map(Into::into).collect();
        let (target, resolver) = Promise::with_resolvers();

        let count = inputs.len();
        if count == 0 {
            resolver.fulfill(Value::list(Vec::new()));
            return target;
        }

        let records = Rc::new(RefCell::new(vec![Value::Unit; count]));
        let remaining = Rc::new(Cell::new(count));

        fn record(
            outcome: Outcome,
            index: usize,
            records: &Rc<RefCell<Vec<Value>>>,
            remaining: &Rc<Cell<usize>>,
            resolver: &Resolver,
        ) {
            records.borrow_mut()[index] = Value::from(outcome);
            remaining.set(remaining.get() - 1);

            if remaining.get() == 0 {
                resolver.fulfill(Value::list(records.borrow().clone()));
            }
        }

        for (index, input) in inputs.into_iter().enumerate() {
            let fulfilled = {
                let records = records.clone();
                let remaining = remaining.clone();
                let resolver = resolver.clone();

                move |value: Value| -> Result<Value, Value> {
                    record(
                        Outcome::fulfilled(value),
                        index,
                        &records,
                        &remaining,
                        &resolver,
                    );
                    Ok(Value::Unit)
                }
            };

            let rejected = {
                let records = records.clone();
                let remaining = remaining.clone();
                let resolver = resolver.clone();

                move |reason: Value| -> Result<Value, Value> {
                    record(
                        Outcome::rejected(reason),
                        index,
                        &records,
                        &remaining,
                        &resolver,
                    );
                    Ok(Value::Unit)
                }
            };

            Promise::resolve(input).subscribe(Some(Box::new(fulfilled)), Some(Box::new(rejected)));
        }

        target
    }
}
