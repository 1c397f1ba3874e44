//! Snapshot reconstruction over whole histories.

use retrace::Document;
use serde_json::json;

use crate::helpers::{author, create, destroy, post, save, setup, tag};

fn comment_shape(id: i64, body: &str) -> Document {
    // Reconstructed referenced children only carry traced attributes.
    Document::new("Comment").with_id(id).with("body", body)
}

/// Five states exercising scalars, a replaced nested-one child, reordered and removed
/// items, and a referenced list that comes and goes.
fn history() -> Vec<Document> {
    vec![
        post(1, "A")
            .with_one("author", author(5, "Ada"))
            .with_many("tags", vec![tag(1, "x"), tag(2, "y")]),
        post(1, "B")
            .with_one("author", author(5, "Ada L."))
            .with_many("tags", vec![tag(1, "x"), tag(2, "y"), tag(3, "z")]),
        post(1, "B")
            .with("body", "hello")
            .with_many("tags", vec![tag(3, "z"), tag(1, "x")]),
        post(1, "C")
            .with("body", "hello")
            .with_one("author", author(6, "Bob"))
            .with_many("tags", vec![tag(3, "zz"), tag(1, "x")])
            .with_many("comments", vec![comment_shape(7, "hi")]),
        post(1, "C")
            .with_one("author", author(6, "Bob"))
            .with_many("tags", vec![tag(1, "x"), tag(2, "y")]),
    ]
}

#[test]
fn update_before_drops_the_added_item() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x")]);
    let s1 = post(1, "B").with_many("tags", vec![tag(1, "x"), tag(2, "y")]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);

    assert_eq!(tracer.before(&update, Some(&s1)).unwrap(), Some(s0));
    assert_eq!(tracer.after(&update, Some(&s1)).unwrap(), Some(s1));
}

#[test]
fn id_only_item_is_absent_before_its_addition() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x")]);
    let s1 = post(1, "A").with_many("tags", vec![tag(1, "x"), Document::new("Tag").with_id(2)]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);

    assert_eq!(
        tracer.changes(&update).unwrap().to_json(),
        json!({"tags": [{"_id": [1, 1]}, {"_id": [null, 2]}]})
    );
    assert_eq!(tracer.before(&update, Some(&s1)).unwrap(), Some(s0));
    assert_eq!(tracer.after(&update, Some(&s1)).unwrap(), Some(s1));
}

#[test]
fn every_state_of_a_history_is_recoverable() {
    let (tracer, _store) = setup();
    let states = history();
    let mut traces = vec![create(&tracer, &states[0])];
    for pair in states.windows(2) {
        traces.push(save(&tracer, &pair[0], &pair[1]));
    }
    let live = states.last().cloned();

    for (i, trace) in traces.iter().enumerate() {
        let after = tracer.after(trace, live.as_ref()).unwrap();
        assert_eq!(after.as_ref(), Some(&states[i]), "after trace {i}");

        let before = tracer.before(trace, live.as_ref()).unwrap();
        let expected = i.checked_sub(1).map(|prev| &states[prev]);
        assert_eq!(before.as_ref(), expected, "before trace {i}");
    }
}

#[test]
fn destroyed_record_is_rebuilt_from_history_alone() {
    let (tracer, _store) = setup();
    let states = history();
    let mut traces = vec![create(&tracer, &states[0])];
    for pair in states.windows(2) {
        traces.push(save(&tracer, &pair[0], &pair[1]));
    }
    let last = states.last().unwrap();
    let removal = destroy(&tracer, last);

    assert_eq!(tracer.before(&removal, None).unwrap().as_ref(), Some(last));
    assert_eq!(tracer.after(&removal, None).unwrap(), None);
    assert_eq!(
        tracer.before(&traces[2], None).unwrap().as_ref(),
        Some(&states[1])
    );
}

#[test]
fn unchanged_items_keep_their_positions() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x"), tag(2, "y"), tag(3, "z")]);
    let s1 = post(1, "A").with_many("tags", vec![tag(1, "x"), tag(2, "yy"), tag(3, "z")]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);

    let before = tracer.before(&update, Some(&s1)).unwrap().unwrap();
    let labels: Vec<_> = before
        .many("tags")
        .iter()
        .map(|t| t.scalar("label").cloned())
        .collect();
    assert_eq!(labels, vec![Some(json!("x")), Some(json!("y")), Some(json!("z"))]);
}

#[test]
fn reordering_is_reverted() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_many("tags", vec![tag(1, "x"), tag(2, "y")]);
    let s1 = post(1, "A").with_many("tags", vec![tag(2, "y"), tag(1, "x")]);
    create(&tracer, &s0);
    let update = save(&tracer, &s0, &s1);

    assert_eq!(tracer.before(&update, Some(&s1)).unwrap(), Some(s0));
}

#[test]
fn replaced_child_gets_its_old_identity_back() {
    let (tracer, _store) = setup();
    let s0 = post(1, "A").with_one("author", author(5, "Ada"));
    let s1 = post(1, "A").with_one("author", author(6, "Ada"));
    create(&tracer, &s0);
    let swap = save(&tracer, &s0, &s1);

    assert_eq!(tracer.before(&swap, Some(&s1)).unwrap(), Some(s0));
}

#[test]
fn recreated_record_has_two_lives() {
    let (tracer, _store) = setup();
    let first = post(1, "A").with("body", "old");
    let second = post(1, "B");
    let born = create(&tracer, &first);
    let died = destroy(&tracer, &first);
    let reborn = create(&tracer, &second);

    assert_eq!(tracer.after(&born, Some(&second)).unwrap(), Some(first.clone()));
    assert_eq!(tracer.before(&died, Some(&second)).unwrap(), Some(first));
    assert_eq!(tracer.after(&died, Some(&second)).unwrap(), None);
    assert_eq!(tracer.before(&reborn, Some(&second)).unwrap(), None);
    assert_eq!(tracer.after(&reborn, Some(&second)).unwrap(), Some(second));
}
