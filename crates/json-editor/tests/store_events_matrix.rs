use std::cell::{Cell, RefCell};
use std::rc::Rc;

use json_editor::{parse_path, Commit, DocumentStore, Mutation, Node, StoreError};
use serde_json::{json, Value};

fn store() -> DocumentStore {
    DocumentStore::from_json(&json!({
        "titles": [{"title": "A"}],
        "keywords": [{"value": "a"}, {"value": "b"}, {"value": "c"}]
    }))
}

#[test]
fn get_never_panics_matrix() {
    let s = store();
    let cases = [
        ("", true),
        ("/titles/0/title", true),
        ("/titles/1", false),
        ("/titles/0/title/deeper", false),
        ("/missing", false),
        ("/keywords/-1", false),
    ];
    for (pointer, present) in cases {
        assert_eq!(s.get(&parse_path(pointer)).is_some(), present, "at {pointer:?}");
    }
}

#[test]
fn set_then_get_roundtrip() {
    let s = store();
    let value = json!({"value": "new", "schema": "INSPIRE"});
    s.set_in(parse_path("/keywords/1"), Node::from(&value)).unwrap();
    assert_eq!(s.get(&parse_path("/keywords/1")).unwrap().to_value(), value);
}

#[test]
fn remove_shifts_later_siblings() {
    let s = store();
    s.remove_in(parse_path("/keywords/0")).unwrap();
    assert_eq!(
        s.get(&parse_path("/keywords/0/value")).unwrap().to_value(),
        json!("b")
    );
    assert_eq!(
        s.get(&parse_path("/keywords/1/value")).unwrap().to_value(),
        json!("c")
    );
    assert!(s.get(&parse_path("/keywords/2")).is_none());
}

#[test]
fn subscribers_see_each_event_once_in_order() {
    let s = store();
    let seen: Rc<RefCell<Vec<(usize, u64)>>> = Rc::new(RefCell::new(Vec::new()));
    for listener in 0..3 {
        let seen = seen.clone();
        s.on_change(move |event| seen.borrow_mut().push((listener, event.revision)));
    }
    s.set_in(parse_path("/titles/0/title"), Node::from(json!("B")))
        .unwrap();
    s.remove_in(parse_path("/keywords/2")).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![(0, 1), (1, 1), (2, 1), (0, 2), (1, 2), (2, 2)]
    );
}

#[test]
fn no_replay_on_subscribe() {
    let s = store();
    s.set_in(parse_path("/titles/0/title"), Node::from(json!("B")))
        .unwrap();
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    s.on_change(move |_| c.set(c.get() + 1));
    assert_eq!(count.get(), 0);
}

#[test]
fn mutation_from_handler_is_deferred_until_round_completes() {
    let s = store();
    let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let weak = s.downgrade();
    let log = order.clone();
    s.on_change(move |event| {
        log.borrow_mut().push(format!("first@{}", event.revision));
        if event.revision == 1 {
            let store = weak.upgrade().expect("store alive");
            let commit = store
                .set_in(parse_path("/titles/0/title"), Node::from(json!("from handler")))
                .unwrap();
            assert_eq!(commit, Commit::Deferred);
        }
    });
    let log = order.clone();
    s.on_change(move |event| log.borrow_mut().push(format!("second@{}", event.revision)));

    let commit = s
        .set_in(parse_path("/titles/0/title"), Node::from(json!("user")))
        .unwrap();
    assert!(commit.is_applied());
    assert_eq!(
        *order.borrow(),
        vec!["first@1", "second@1", "first@2", "second@2"]
    );
    assert_eq!(
        s.get(&parse_path("/titles/0/title")).unwrap().to_value(),
        json!("from handler")
    );
}

#[test]
fn deferred_failure_is_logged_not_raised() {
    let s = store();
    let weak = s.downgrade();
    s.on_change(move |event| {
        if event.revision == 1 {
            if let Some(store) = weak.upgrade() {
                let _ = store.remove_in(parse_path("/nope/0"));
            }
        }
    });
    s.set_in(parse_path("/titles/0/title"), Node::from(json!("x")))
        .unwrap();
    assert_eq!(s.revision(), 1);
}

#[test]
fn listener_removed_mid_round_is_skipped() {
    let s = store();
    let calls = Rc::new(Cell::new(0));
    let second_id = Rc::new(Cell::new(0));

    let weak = s.downgrade();
    let target = second_id.clone();
    s.on_change(move |_| {
        if let Some(store) = weak.upgrade() {
            store.off_change(target.get());
        }
    });
    let c = calls.clone();
    second_id.set(s.on_change(move |_| c.set(c.get() + 1)));

    s.set_in(parse_path("/titles/0/title"), Node::from(json!("x")))
        .unwrap();
    s.set_in(parse_path("/titles/0/title"), Node::from(json!("y")))
        .unwrap();
    assert_eq!(calls.get(), 0);
}

#[test]
fn equal_results_are_not_echoed() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    s.on_change(move |_| c.set(c.get() + 1));
    let current = s.current();
    assert_eq!(s.replace(current).unwrap(), Commit::Unchanged);
    assert_eq!(
        s.apply(vec![
            Mutation::Swap {
                array: parse_path("/keywords"),
                a: 0,
                b: 1
            },
            Mutation::Swap {
                array: parse_path("/keywords"),
                a: 0,
                b: 1
            },
        ])
        .unwrap(),
        Commit::Unchanged
    );
    assert_eq!(count.get(), 0);
}

#[test]
fn batch_errors_are_atomic() {
    let s = store();
    let before: Value = s.to_json();
    let err = s
        .apply(vec![
            Mutation::Insert {
                path: parse_path("/keywords/0"),
                value: Node::from(json!({"value": "z"})),
            },
            Mutation::Set {
                path: parse_path("/ghost/field"),
                value: Node::Null,
            },
        ])
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound("/ghost".into()));
    assert_eq!(s.to_json(), before);
    assert_eq!(s.revision(), 0);
}

#[test]
fn earlier_roots_stay_valid() {
    let s = store();
    let before = s.current();
    s.remove_in(parse_path("/keywords")).unwrap();
    assert!(before.get(&parse_path("/keywords/2")).is_some());
    assert!(s.get(&parse_path("/keywords")).is_none());
}
