//! Chain adjacency and persistence through the public store API.

use std::sync::Arc;

use retrace::{InMemory, TraceStore, Tracer};
use serde_json::json;

use crate::helpers::{blog_catalog, create, destroy, post, save, setup, tag};

#[test]
fn chains_are_kept_per_target() {
    let (tracer, store) = setup();
    let a0 = post(1, "A");
    let a1 = post(1, "A2");
    let b0 = post(2, "B");
    let first = create(&tracer, &a0);
    let other = create(&tracer, &b0);
    let second = save(&tracer, &a0, &a1);

    let chain = store.chain("Post", &json!(1)).unwrap();
    let ids: Vec<_> = chain.iter().map(|t| t.id().clone()).collect();
    assert_eq!(ids, vec![first.id().clone(), second.id().clone()]);

    assert_eq!(store.next(&first).unwrap().as_ref(), Some(&second));
    assert_eq!(store.previous(&second).unwrap().as_ref(), Some(&first));
    assert_eq!(store.previous(&first).unwrap(), None);
    assert_eq!(store.next(&other).unwrap(), None);
    assert_eq!(store.get(other.id()).unwrap(), other);
    assert!(store.chain("Post", &json!(3)).unwrap().is_empty());
    assert_eq!(store.len().unwrap(), 3);
}

#[test]
fn creation_times_only_move_forward() {
    let (tracer, store) = setup();
    let mut current = post(1, "v0");
    create(&tracer, &current);
    for step in 1..6 {
        let next = post(1, &format!("v{step}"));
        save(&tracer, &current, &next);
        current = next;
    }

    let chain = store.chain("Post", &json!(1)).unwrap();
    assert_eq!(chain.len(), 6);
    assert!(chain.windows(2).all(|w| w[0].order_key() < w[1].order_key()));
    assert!(chain[0].created_at_utc().is_some());
}

#[test]
fn unknown_trace_is_not_found() {
    let (tracer, _store) = setup();
    let created = create(&tracer, &post(1, "A"));

    let empty = InMemory::new();
    let err = empty.get(created.id()).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.trace_id(), Some(created.id()));
    assert!(empty.previous(&created).unwrap_err().is_not_found());
}

#[test]
fn appending_twice_is_rejected() {
    let (tracer, store) = setup();
    let created = create(&tracer, &post(1, "A"));

    let err = store.append(created).unwrap_err();
    assert_eq!(err.module(), "store");
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn persisted_history_still_reconstructs() {
    let (tracer, store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x")]);
    let s1 = post(1, "B").with_many("tags", vec![tag(2, "y"), tag(1, "x")]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);
    let removal = destroy(&tracer, &s1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("traces.json");
    store.save_to_file(&path).unwrap();

    let loaded = Arc::new(InMemory::load_from_file(&path).unwrap());
    assert_eq!(
        loaded.chain("Post", &json!(1)).unwrap(),
        store.chain("Post", &json!(1)).unwrap()
    );

    let reopened = Tracer::new(blog_catalog(), loaded);
    let update = reopened.store().get(update.id()).unwrap();
    let removal = reopened.store().get(removal.id()).unwrap();
    assert_eq!(reopened.before(&removal, None).unwrap(), Some(s1));
    assert_eq!(reopened.before(&update, None).unwrap(), Some(s0));
    assert_eq!(
        reopened.changes(&update).unwrap(),
        tracer.changes(&update).unwrap()
    );
}

#[test]
fn unreadable_store_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("traces.json");
    std::fs::write(&path, "not json").unwrap();

    let err = InMemory::load_from_file(&path).unwrap_err();
    assert_eq!(err.module(), "store");
    assert!(!err.is_not_found());
}
