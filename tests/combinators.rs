use promitto::{Outcome, Promise, PromiseError, State, TurnQueue, Value};

#[test]
fn test_all_gathers_values_in_input_order() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let gathered = Promise::all([
        Value::from(1),
        Value::from(Promise::resolve(2)),
        Value::from(3),
    ]);

    queue.run_until_idle();

    assert_eq!(
        gathered.settled(),
        Some(Value::list(vec![1.into(), 2.into(), 3.into()])),
        "all should keep input order regardless of settle order"
    );
}

#[test]
fn test_all_rejects_with_the_first_rejection() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let (late, late_resolver) = Promise::with_resolvers();

    let gathered = Promise::all([
        Value::from(1),
        Value::from(Promise::reject("x")),
        Value::from(late.clone()),
    ]);

    queue.run_until_idle();

    assert_eq!(gathered.state(), State::Rejected);
    assert_eq!(gathered.settled(), Some(Value::from("x")));

    // A straggler settling afterwards must not disturb the outcome.
    late_resolver.fulfill(2);
    queue.run_until_idle();
    assert_eq!(gathered.settled(), Some(Value::from("x")));
}

#[test]
fn test_all_of_nothing_fulfills_with_an_empty_list() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let gathered = Promise::all(Vec::<Value>::new());

    assert_eq!(gathered.settled(), Some(Value::list(Vec::new())));
}

#[test]
fn test_race_adopts_the_first_settled_input() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let (slow, slow_resolver) = Promise::with_resolvers();
    let (fast, fast_resolver) = Promise::with_resolvers();

    let winner = Promise::race([Value::from(slow), Value::from(fast)]);

    fast_resolver.fulfill("fast");
    slow_resolver.fulfill("slow");
    queue.run_until_idle();

    assert_eq!(winner.settled(), Some(Value::from("fast")));
}

#[test]
fn test_race_adopts_the_first_rejection_too() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let (pending, _resolver) = Promise::with_resolvers();

    let winner = Promise::race([Value::from(Promise::reject("lost")), Value::from(pending)]);

    queue.run_until_idle();

    assert_eq!(winner.state(), State::Rejected);
    assert_eq!(winner.settled(), Some(Value::from("lost")));
}

#[test]
fn test_race_with_a_plain_value_fulfills_with_it() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let winner = Promise::race([Value::from(11)]);

    queue.run_until_idle();

    assert_eq!(winner.settled(), Some(Value::Int(11)));
}

#[test]
fn test_race_of_nothing_never_settles() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let winner = Promise::race(Vec::<Value>::new());

    queue.run_until_idle();

    assert_eq!(
        winner.state(),
        State::Pending,
        "no input can ever win an empty race"
    );
}

#[test]
fn test_any_fulfills_with_the_first_success() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let first = Promise::any([
        Value::from(Promise::reject("a")),
        Value::from(Promise::resolve(2)),
        Value::from(Promise::resolve(3)),
    ]);

    queue.run_until_idle();

    assert_eq!(first.settled(), Some(Value::Int(2)));
}

#[test]
fn test_any_aggregates_reasons_in_input_order() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let (first, first_resolver) = Promise::with_resolvers();
    let (second, second_resolver) = Promise::with_resolvers();

    let none = Promise::any([Value::from(first), Value::from(second)]);

    // Reject out of order; the aggregate must still follow input order.
    second_resolver.reject("b");
    first_resolver.reject("a");
    queue.run_until_idle();

    assert_eq!(
        none.settled(),
        Some(Value::error(PromiseError::AllRejected(vec![
            "a".into(),
            "b".into(),
        ]))),
    );
}

#[test]
fn test_any_of_nothing_rejects_immediately() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let none = Promise::any(Vec::<Value>::new());

    assert_eq!(
        none.settled(),
        Some(Value::error(PromiseError::AllRejected(Vec::new()))),
        "no success is possible with no inputs"
    );
}

#[test]
fn test_all_settled_records_both_outcomes_in_order() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let report = Promise::all_settled([
        Value::from(Promise::resolve(1)),
        Value::from(Promise::reject("e")),
    ]);

    queue.run_until_idle();

    assert_eq!(
        report.settled(),
        Some(Value::list(vec![
            Outcome::fulfilled(Value::Int(1)).into(),
            Outcome::rejected(Value::from("e")).into(),
        ])),
    );
}

#[test]
fn test_all_settled_never_rejects() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let report = Promise::all_settled([
        Value::from(Promise::reject("a")),
        Value::from(Promise::reject("b")),
    ]);

    queue.run_until_idle();

    assert_eq!(report.state(), State::Fulfilled);
}

#[test]
fn test_all_settled_of_nothing_fulfills_with_an_empty_list() {
    let queue = TurnQueue::new();
    let _guard = queue.enter();

    let report = Promise::all_settled(Vec::<Value>::new());

    assert_eq!(report.settled(), Some(Value::list(Vec::new())));
}
