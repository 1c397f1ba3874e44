use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use retrace::{
    Catalog, Clock, Document, InMemory, ModelOptions, StaticSchema, Trace, TraceOptions, Tracer,
};

/// Blog schema used across the suite.
///
/// `Post` embeds one `Author` and many `Tag`s, and references many `Comment`s through
/// `post_id`.
pub fn blog_schema() -> StaticSchema {
    StaticSchema::new()
        .model("Post", |m| {
            m.field("title")
                .field("body")
                .field("created_at")
                .field("updated_at")
                .embeds_one("author", "Author")
                .embeds_many("tags", "Tag")
                .has_many("comments", "Comment", "post_id")
        })
        .model("Author", |m| m.field("name"))
        .model("Tag", |m| m.field("label"))
        .model("Comment", |m| m.field("body").field("post_id"))
}

/// Options tracing the referenced `comments` relation.
pub fn blog_options() -> TraceOptions {
    TraceOptions::default().with_model(
        "Post",
        ModelOptions {
            references: vec!["comments".into()],
            ..ModelOptions::default()
        },
    )
}

pub fn blog_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(blog_schema(), blog_options()))
}

/// Clock advancing by a fixed step on every reading.
#[derive(Debug)]
pub struct StepClock {
    millis: AtomicU64,
    step: u64,
}

impl StepClock {
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            millis: AtomicU64::new(start),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now_millis(&self) -> u64 {
        self.millis.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// A tracer over a fresh in-memory store, with one second between traces.
pub fn setup() -> (Tracer, Arc<InMemory>) {
    setup_with_clock(StepClock::new(1_704_067_200_000, 1_000))
}

pub fn setup_with_clock(clock: StepClock) -> (Tracer, Arc<InMemory>) {
    let store = Arc::new(InMemory::new());
    let tracer = Tracer::new(blog_catalog(), store.clone()).with_clock(Arc::new(clock));
    (tracer, store)
}

pub fn post(id: i64, title: &str) -> Document {
    Document::new("Post").with_id(id).with("title", title)
}

pub fn tag(id: i64, label: &str) -> Document {
    Document::new("Tag").with_id(id).with("label", label)
}

pub fn author(id: i64, name: &str) -> Document {
    Document::new("Author").with_id(id).with("name", name)
}

pub fn comment(id: i64, post_id: i64, body: &str) -> Document {
    Document::new("Comment")
        .with_id(id)
        .with("post_id", post_id)
        .with("body", body)
}

/// Records the creation of `record`.
pub fn create(tracer: &Tracer, record: &Document) -> Trace {
    tracer
        .trace_create(record, None)
        .expect("create should trace")
        .expect("create should not be skipped")
}

/// Records the change from `current` to `next`.
pub fn save(tracer: &Tracer, current: &Document, next: &Document) -> Trace {
    let before = tracer.capture(current).expect("capture should succeed");
    tracer
        .trace_update(&before, next, None)
        .expect("update should trace")
        .expect("update should not be skipped")
}

/// Records the removal of `current`.
pub fn destroy(tracer: &Tracer, current: &Document) -> Trace {
    let before = tracer.capture(current).expect("capture should succeed");
    tracer
        .trace_destroy(&before, current, None)
        .expect("destroy should trace")
        .expect("destroy should not be skipped")
}
