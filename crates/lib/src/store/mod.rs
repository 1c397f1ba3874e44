//! Trace chain storage.
//!
//! A [`TraceStore`] keeps every trace and answers adjacency queries within one target's
//! chain. Order is `(created_at, seq)`: the store assigns a strictly increasing `seq` on
//! append, so entries sharing a timestamp keep their append order.

pub mod errors;
pub mod in_memory;

pub use errors::StoreError;

use crate::{Result, Trace, TraceId, value::Scalar};

/// Storage for trace chains.
///
/// All methods take `&self`; implementations handle their own locking.
pub trait TraceStore: Send + Sync {
    /// Stores a new trace, assigning its sequence number, and returns the stored copy.
    fn append(&self, trace: Trace) -> Result<Trace>;

    /// Fetches a trace by id.
    fn get(&self, id: &TraceId) -> Result<Trace>;

    /// The entry immediately before `trace` in its chain.
    fn previous(&self, trace: &Trace) -> Result<Option<Trace>>;

    /// The entry immediately after `trace` in its chain.
    fn next(&self, trace: &Trace) -> Result<Option<Trace>>;

    /// Every entry for one target, oldest first.
    fn chain(&self, model: &str, target_id: &Scalar) -> Result<Vec<Trace>>;
}
