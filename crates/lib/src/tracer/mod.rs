//! Host-facing entry point.
//!
//! A [`Tracer`] ties a [`Catalog`], a [`TraceStore`], a [`Clock`] and an optional author
//! provider together. The host calls [`Tracer::capture`] before persisting a write and one
//! of the `trace_*` methods after it; later, [`Tracer::changes`], [`Tracer::before`] and
//! [`Tracer::after`] answer questions about any stored trace.
//!
//! The host must not run two captures for the same record in one logical write; nested
//! saves triggered by a write are expected to be filtered out by the host.
//!
//! ```
//! use std::sync::Arc;
//! use retrace::{Catalog, Document, InMemory, StaticSchema, TraceOptions, Tracer};
//!
//! let schema = StaticSchema::new().model("Post", |m| m.field("title"));
//! let catalog = Arc::new(Catalog::new(schema, TraceOptions::default()));
//! let tracer = Tracer::new(catalog, Arc::new(InMemory::new()));
//!
//! let post = Document::new("Post").with_id(1).with("title", "Hello");
//! let created = tracer.trace_create(&post, None).unwrap().unwrap();
//!
//! let before = tracer.capture(&post).unwrap();
//! let edited = post.clone().with("title", "Hello, world");
//! let updated = tracer.trace_update(&before, &edited, None).unwrap().unwrap();
//!
//! let previous = tracer.before(&updated, Some(&edited)).unwrap().unwrap();
//! assert_eq!(previous, post);
//! assert_eq!(tracer.traces_for(&edited).unwrap().len(), 2);
//! # let _ = created;
//! ```

use std::sync::Arc;

use crate::{
    Result,
    clock::{Clock, SystemClock},
    diff::{build_diff, mark_destroyed},
    reconstruct::{Direction, reconstruct},
    record::{Document, Record, capture},
    resolve::{ChangeSet, resolve_change_set},
    schema::Catalog,
    store::TraceStore,
    trace::{Action, Trace, TraceError},
    value::Tree,
};

/// Supplies the current author reference, if any.
pub type AuthorProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Records traces for live records and answers history queries.
#[derive(Clone)]
pub struct Tracer {
    catalog: Arc<Catalog>,
    store: Arc<dyn TraceStore>,
    clock: Arc<dyn Clock>,
    author: Option<AuthorProvider>,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("catalog", &self.catalog)
            .field("clock", &self.clock)
            .field("author", &self.author.is_some())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer using the system clock and no author provider.
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn TraceStore>) -> Self {
        Self {
            catalog,
            store,
            clock: Arc::new(SystemClock),
            author: None,
        }
    }

    /// Replaces the clock used to stamp traces.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Stamps every new trace with the author returned by `provider`.
    pub fn with_author<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.author = Some(Arc::new(provider));
        self
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The store in use.
    pub fn store(&self) -> &dyn TraceStore {
        self.store.as_ref()
    }

    /// Captures the full traced state of `record`, to be passed back as `before`.
    pub fn capture(&self, record: &dyn Record) -> Result<Tree> {
        capture(&self.catalog, record)
    }

    /// Traces the creation of `record`.
    pub fn trace_create(&self, record: &dyn Record, message: Option<&str>) -> Result<Option<Trace>> {
        self.trace_action(&Tree::new(), record, Action::Create.as_str(), message)
    }

    /// Traces a save of `record`, given its state captured before the write.
    pub fn trace_update(
        &self,
        before: &Tree,
        record: &dyn Record,
        message: Option<&str>,
    ) -> Result<Option<Trace>> {
        self.trace_action(before, record, Action::Update.as_str(), message)
    }

    /// Traces the removal of `record`, given its state captured before the removal.
    pub fn trace_destroy(
        &self,
        before: &Tree,
        record: &dyn Record,
        message: Option<&str>,
    ) -> Result<Option<Trace>> {
        self.trace_action(before, record, Action::Destroy.as_str(), message)
    }

    /// Traces an arbitrary action such as `"publish"`, or `"publish!"` to force it.
    ///
    /// Returns `Ok(None)` when a non-mandatory action is not traced for the model or
    /// changed nothing.
    pub fn trace_action(
        &self,
        before: &Tree,
        record: &dyn Record,
        action: &str,
        message: Option<&str>,
    ) -> Result<Option<Trace>> {
        let model = record.model();
        let (parsed, mandatory) = Action::parse(action);
        let diff = match parsed {
            Action::Destroy => mark_destroyed(&self.catalog, model, before)?,
            _ => build_diff(&self.catalog, before, record)?,
        };
        let target_id = record
            .id()
            .filter(|id| !id.is_null())
            .ok_or_else(|| TraceError::MissingTargetId {
                model: model.to_string(),
            })?;

        let layout = self.catalog.layout(model)?;
        let built = Trace::builder(model, target_id)
            .action(parsed)
            .mandatory(mandatory)
            .message(message.map(str::to_string))
            .author(self.author.as_ref().and_then(|provider| provider()))
            .created_at(self.clock.now_millis())
            .diff(diff)
            .build(&layout);

        let trace = match built {
            Ok(trace) => trace,
            Err(crate::Error::Trace(err)) if err.is_skipped() => {
                tracing::debug!(model, action, reason = %err, "Trace skipped");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let stored = self.store.append(trace)?;
        tracing::debug!(
            trace_id = %stored.id(),
            model,
            action = %stored.action(),
            attributes = stored.diff().len(),
            "Recorded trace"
        );
        Ok(Some(stored))
    }

    /// Every trace of `record`, oldest first.
    pub fn traces_for(&self, record: &dyn Record) -> Result<Vec<Trace>> {
        match record.id() {
            Some(id) => self.store.chain(record.model(), &id),
            None => Ok(Vec::new()),
        }
    }

    /// The resolved change-set of `trace`.
    pub fn changes(&self, trace: &Trace) -> Result<ChangeSet> {
        resolve_change_set(&self.catalog, self.store.as_ref(), trace)
    }

    /// The target of `trace` just before its write; `live` is the current record if any.
    pub fn before(&self, trace: &Trace, live: Option<&Document>) -> Result<Option<Document>> {
        reconstruct(
            &self.catalog,
            self.store.as_ref(),
            trace,
            Direction::Before,
            live,
        )
    }

    /// The target of `trace` just after its write; `live` is the current record if any.
    pub fn after(&self, trace: &Trace, live: Option<&Document>) -> Result<Option<Document>> {
        reconstruct(
            &self.catalog,
            self.store.as_ref(),
            trace,
            Direction::After,
            live,
        )
    }
}
