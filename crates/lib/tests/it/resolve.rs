//! Change-set resolution over stored chains.

use retrace::{Catalog, InMemory, StaticSchema, TraceOptions, resolve_change_set};
use serde_json::json;

use crate::helpers::{
    StepClock, author, comment, create, destroy, post, save, setup, setup_with_clock, tag,
};

#[test]
fn added_item_resolves_against_history() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x")]);
    let s1 = post(1, "B").with_many("tags", vec![tag(1, "x"), tag(2, "y")]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);

    let changes = tracer.changes(&update).unwrap();
    assert_eq!(
        changes.to_json(),
        json!({
            "title": ["A", "B"],
            "tags": [
                {"_id": [1, 1]},
                {"_id": [null, 2], "label": [null, "y"]}
            ]
        })
    );
}

#[test]
fn before_values_skip_unrelated_ancestors() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with("body", "x");
    let s1 = post(1, "A").with("body", "y");
    let s2 = post(1, "A").with("body", "z");
    let s3 = post(1, "D").with("body", "z");
    create(&tracer, &s0);
    save(&tracer, &s0, &s1);
    save(&tracer, &s1, &s2);
    let rename = save(&tracer, &s2, &s3);

    let changes = tracer.changes(&rename).unwrap();
    assert_eq!(changes.to_json(), json!({"title": ["A", "D"]}));
}

#[test]
fn creation_resolves_to_nulls() {
    let (tracer, _store) = setup();
    let record = post(1, "A").with_one("author", author(5, "Ada"));
    let created = create(&tracer, &record);

    assert_eq!(
        tracer.changes(&created).unwrap().to_json(),
        json!({
            "title": [null, "A"],
            "author": {"_id": [null, 5], "name": [null, "Ada"]}
        })
    );
}

#[test]
fn destruction_resolves_to_nulls_after() {
    let (tracer, _store) = setup();
    let record = post(1, "A").with_one("author", author(5, "Ada"));
    create(&tracer, &record);
    let destroyed = destroy(&tracer, &record);

    assert!(destroyed.diff().is_destroyed());
    assert_eq!(
        tracer.changes(&destroyed).unwrap().to_json(),
        json!({
            "_id": [1, null],
            "title": ["A", null],
            "author": {"_id": [5, null], "name": ["Ada", null]}
        })
    );
}

#[test]
fn recreated_record_does_not_see_past_the_destroy() {
    let (tracer, _store) = setup();
    let first = post(1, "A").with("body", "old");
    create(&tracer, &first);
    destroy(&tracer, &first);
    let again = create(&tracer, &post(1, "B"));

    assert_eq!(
        tracer.changes(&again).unwrap().to_json(),
        json!({"title": [null, "B"]})
    );
}

#[test]
fn removed_items_come_last_with_their_full_value() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x"), tag(2, "y")]);
    let s1 = post(1, "A").with_many("tags", vec![tag(2, "y")]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);

    let changes = tracer.changes(&update).unwrap();
    let items = changes.many("tags").unwrap();
    assert_eq!(items.len(), 2);
    assert!(!items[0].is_removed());
    assert!(items[1].is_removed());
    assert_eq!(
        changes.to_json(),
        json!({
            "tags": [
                {"_id": [2, 2]},
                {"$destroyed": true, "_id": [1, null], "label": ["x", null]}
            ]
        })
    );
}

#[test]
fn item_before_values_come_from_older_traces() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x"), tag(2, "y")]);
    let s1 = post(1, "B").with_many("tags", vec![tag(1, "x"), tag(2, "y")]);
    let s2 = post(1, "B").with_many("tags", vec![tag(1, "x"), tag(2, "z")]);
    create(&tracer, &s0);
    save(&tracer, &s0, &s1);
    let relabel = save(&tracer, &s1, &s2);

    assert_eq!(
        tracer.changes(&relabel).unwrap().to_json(),
        json!({
            "tags": [
                {"_id": [1, 1]},
                {"_id": [2, 2], "label": ["y", "z"]}
            ]
        })
    );
}

#[test]
fn replaced_child_after_removal_starts_fresh() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_one("author", author(5, "Ada"));
    let s1 = post(1, "A");
    let s2 = post(1, "A").with_one("author", author(6, "Bob"));
    create(&tracer, &s0);
    save(&tracer, &s0, &s1);
    let readd = save(&tracer, &s1, &s2);

    assert_eq!(
        tracer.changes(&readd).unwrap().to_json(),
        json!({"author": {"_id": [null, 6], "name": [null, "Bob"]}})
    );
}

#[test]
fn replaced_child_resolves_against_the_old_one() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_one("author", author(5, "Ada"));
    let s1 = post(1, "A").with_one("author", author(6, "Bob"));
    create(&tracer, &s0);
    let swap = save(&tracer, &s0, &s1);

    assert_eq!(
        tracer.changes(&swap).unwrap().to_json(),
        json!({"author": {"_id": [5, 6], "name": ["Ada", "Bob"]}})
    );
}

#[test]
fn cleared_scalar_is_a_null_before_value() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with("body", "text");
    let s1 = post(1, "A");
    let s2 = post(1, "A").with("body", "again");
    create(&tracer, &s0);
    let cleared = save(&tracer, &s0, &s1);
    let refilled = save(&tracer, &s1, &s2);

    assert_eq!(
        tracer.changes(&cleared).unwrap().to_json(),
        json!({"body": ["text", null]})
    );
    assert_eq!(
        tracer.changes(&refilled).unwrap().to_json(),
        json!({"body": [null, "again"]})
    );
}

#[test]
fn referenced_children_resolve_like_embedded_ones() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("comments", vec![comment(7, 1, "hi")]);
    let s1 = post(1, "A").with_many("comments", vec![comment(7, 1, "hello")]);
    create(&tracer, &s0);
    let edit = save(&tracer, &s0, &s1);

    assert_eq!(
        tracer.changes(&edit).unwrap().to_json(),
        json!({"comments": [{"_id": [7, 7], "body": ["hi", "hello"]}]})
    );
}

#[test]
fn equal_timestamps_resolve_in_append_order() {
    let (tracer, store) = setup_with_clock(StepClock::new(1_000, 0));
    let s0 = post(1, "A");
    let s1 = post(1, "B");
    let s2 = post(1, "C");
    create(&tracer, &s0);
    save(&tracer, &s0, &s1);
    let last = save(&tracer, &s1, &s2);

    let chain = retrace::TraceStore::chain(store.as_ref(), "Post", &json!(1)).unwrap();
    assert!(chain.iter().all(|trace| trace.created_at() == 1_000));
    assert_eq!(
        tracer.changes(&last).unwrap().to_json(),
        json!({"title": ["B", "C"]})
    );
}

#[test]
fn dropped_attribute_is_a_schema_mismatch() {
    let (tracer, store) = setup();
    let s0 = post(1, "A").with("body", "text");
    create(&tracer, &s0);
    let edit = save(&tracer, &s0, &post(1, "A").with("body", "more"));

    let narrowed = Catalog::new(
        StaticSchema::new().model("Post", |m| m.field("title")),
        TraceOptions::default(),
    );
    let err = resolve_change_set(&narrowed, store.as_ref(), &edit).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert_eq!(err.trace_id(), Some(edit.id()));
    assert!(err.to_string().contains("body"));
}

#[test]
fn trace_missing_from_store_is_a_broken_chain() {
    let (tracer, _store) = setup();
    let created = create(&tracer, &post(1, "A"));

    let elsewhere = InMemory::new();
    let err = resolve_change_set(tracer.catalog(), &elsewhere, &created).unwrap_err();
    assert!(err.is_broken_chain());
    assert_eq!(err.trace_id(), Some(created.id()));
}
