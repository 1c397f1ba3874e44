//! End-to-end tracer lifecycle.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use retrace::{Action, Catalog, Document, InMemory, TraceOptions, Tracer, Tree};
use serde_json::json;

use crate::helpers::{StepClock, author, blog_schema, create, post, save, setup, tag};

#[test]
fn lifecycle_records_every_write() {
    let user = Arc::new(Mutex::new(Some("ada".to_string())));
    let provider = user.clone();
    let (tracer, _store) = setup();
    let tracer = tracer.with_author(move || provider.lock().ok().and_then(|u| u.clone()));

    let draft = post(1, "Draft").with_one("author", author(5, "Ada"));
    let created = tracer
        .trace_create(&draft, Some("first draft"))
        .unwrap()
        .unwrap();
    assert_eq!(created.action(), &Action::Create);
    assert_eq!(created.message(), Some("first draft"));
    assert_eq!(created.author_id(), Some("ada"));
    assert_eq!(created.target_id(), &json!(1));

    *user.lock().unwrap() = None;
    let edited = draft.clone().with("body", "text");
    let before = tracer.capture(&draft).unwrap();
    let updated = tracer.trace_update(&before, &edited, None).unwrap().unwrap();
    assert_eq!(updated.author_id(), None);
    assert_eq!(updated.message(), None);
    assert!(updated.created_at() > created.created_at());

    let before = tracer.capture(&edited).unwrap();
    let removed = tracer
        .trace_destroy(&before, &edited, Some("spam"))
        .unwrap()
        .unwrap();
    assert_eq!(removed.action(), &Action::Destroy);
    assert!(removed.diff().is_destroyed());

    let history = tracer.traces_for(&edited).unwrap();
    assert_eq!(history, vec![created, updated, removed.clone()]);
    assert_eq!(tracer.before(&removed, None).unwrap(), Some(edited));
}

#[test]
fn custom_actions_and_forced_traces() {
    let (tracer, _store) = setup();
    let record = post(1, "A");
    create(&tracer, &record);

    let before = tracer.capture(&record).unwrap();
    let published = record.clone().with("body", "live");
    let publish = tracer
        .trace_action(&before, &published, "publish", Some("go live"))
        .unwrap()
        .unwrap();
    assert_eq!(publish.action(), &Action::Custom("publish".into()));
    assert_eq!(publish.diff().to_json(), json!({"body": "live"}));

    // Nothing changed, so only the forced variant leaves a trace.
    let before = tracer.capture(&published).unwrap();
    assert!(
        tracer
            .trace_action(&before, &published, "touch", None)
            .unwrap()
            .is_none()
    );
    let touch = tracer
        .trace_action(&before, &published, "touch!", None)
        .unwrap()
        .unwrap();
    assert!(touch.diff().is_empty());
    assert!(tracer.changes(&touch).unwrap().is_empty());
    assert_eq!(tracer.traces_for(&published).unwrap().len(), 3);
}

#[test]
fn configured_actions_limit_what_is_traced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracing.json");
    std::fs::write(
        &path,
        r#"{
            "global": {"ignore": ["updated_at"]},
            "models": {
                "Post": {"actions": ["update", "destroy"], "references": ["comments"]}
            }
        }"#,
    )
    .unwrap();
    let options = TraceOptions::load_from_file(&path).unwrap();
    let catalog = Arc::new(Catalog::new(blog_schema(), options));
    let tracer = Tracer::new(catalog, Arc::new(InMemory::new()))
        .with_clock(Arc::new(StepClock::new(0, 1)));

    let record = post(1, "A");
    assert!(tracer.trace_create(&record, None).unwrap().is_none());
    let forced = tracer
        .trace_action(&Tree::new(), &record, "create!", None)
        .unwrap()
        .unwrap();
    assert_eq!(forced.action(), &Action::Create);

    let before = tracer.capture(&record).unwrap();
    let next = post(1, "B").with("updated_at", "now");
    let update = tracer.trace_update(&before, &next, None).unwrap().unwrap();
    assert_eq!(update.diff().to_json(), json!({"title": "B"}));
}

#[test]
fn unchanged_saves_leave_no_trace() {
    let (tracer, store) = setup();
    let record = post(1, "A").with_many("tags", vec![tag(1, "x")]);
    create(&tracer, &record);

    let before = tracer.capture(&record).unwrap();
    let touched = record.clone().with("updated_at", "later");
    assert!(tracer.trace_update(&before, &touched, None).unwrap().is_none());
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn author_provider_is_consulted_per_trace() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let (tracer, _store) = setup();
    let tracer = tracer.with_author(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Some(format!("user-{n}"))
    });

    let s0 = post(1, "A");
    let s1 = post(1, "B");
    let first = create(&tracer, &s0);
    let second = save(&tracer, &s0, &s1);
    assert_eq!(first.author_id(), Some("user-0"));
    assert_eq!(second.author_id(), Some("user-1"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn records_without_ids_are_refused() {
    let (tracer, store) = setup();
    let anonymous = Document::new("Post").with("title", "A");

    let err = tracer.trace_create(&anonymous, None).unwrap_err();
    assert!(err.is_validation_error());
    assert!(tracer.traces_for(&anonymous).unwrap().is_empty());
    assert!(store.is_empty().unwrap());
}

#[test]
fn unknown_models_are_refused() {
    let (tracer, _store) = setup();
    let stranger = Document::new("Invoice").with_id(1).with("total", 10);

    let err = tracer.trace_create(&stranger, None).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.module(), "schema");
}
