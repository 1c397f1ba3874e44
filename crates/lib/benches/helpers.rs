//! Shared helpers for benchmark tests

use std::sync::Arc;

use retrace::{Catalog, Document, InMemory, StaticSchema, Trace, TraceOptions, Tracer};

/// Creates a tracer over a fresh in-memory store for a post/tag schema.
pub fn setup_tracer() -> Tracer {
    let schema = StaticSchema::new()
        .model("Post", |m| {
            m.field("title")
                .field("body")
                .field("views")
                .embeds_many("tags", "Tag")
        })
        .model("Tag", |m| m.field("label"));
    Tracer::new(
        Arc::new(Catalog::new(schema, TraceOptions::default())),
        Arc::new(InMemory::new()),
    )
}

/// Builds the state of the benchmark post after `step` edits.
///
/// Every step bumps `views`; every tenth step retitles the post and every
/// twenty-fifth relabels one tag, so older attributes sit far back in the chain.
pub fn post_at(step: usize, tag_count: usize) -> Document {
    let tags = (0..tag_count)
        .map(|i| {
            let generation = if i == (step / 25) % tag_count.max(1) { step / 25 } else { 0 };
            Document::new("Tag")
                .with_id(i as i64)
                .with("label", format!("tag_{i}_{generation}"))
        })
        .collect();
    Document::new("Post")
        .with_id(1)
        .with("title", format!("title_{}", step / 10))
        .with("body", "benchmark body")
        .with("views", step as i64)
        .with_many("tags", tags)
}

/// Records a chain of `length` traces and returns them with the final live state.
pub fn build_chain(tracer: &Tracer, length: usize, tag_count: usize) -> (Vec<Trace>, Document) {
    let mut current = post_at(0, tag_count);
    let mut traces = vec![
        tracer
            .trace_create(&current, None)
            .expect("Failed to trace create")
            .expect("Create should not be skipped"),
    ];
    for step in 1..length {
        let next = post_at(step, tag_count);
        let before = tracer.capture(&current).expect("Failed to capture");
        let trace = tracer
            .trace_update(&before, &next, None)
            .expect("Failed to trace update")
            .expect("Update should not be skipped");
        traces.push(trace);
        current = next;
    }
    (traces, current)
}
