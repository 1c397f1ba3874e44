//! In-memory trace store
//!
//! Keeps every chain as a sorted `Vec` behind one `RwLock`, suitable for tests,
//! development, or hosts that persist the whole state themselves via
//! [`InMemory::save_to_file`] and [`InMemory::load_from_file`].

mod persistence;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{StoreError, TraceStore};
use crate::{
    Result, Trace, TraceId,
    trace::chain_key,
    value::Scalar,
};

#[derive(Debug, Default)]
pub(crate) struct ChainState {
    /// Last sequence number handed out
    pub(crate) seq: u64,
    /// Chain key -> entries sorted by `(created_at, seq)`
    pub(crate) chains: HashMap<String, Vec<Trace>>,
    /// Trace id -> chain key
    pub(crate) index: HashMap<TraceId, String>,
}

impl ChainState {
    /// Files `trace` into its chain; an id may only be stored once.
    fn insert(&mut self, trace: Trace) -> std::result::Result<(), StoreError> {
        if self.index.contains_key(trace.id()) {
            return Err(StoreError::DuplicateTrace {
                id: trace.id().clone(),
            });
        }
        let key = trace.chain_key();
        self.index.insert(trace.id().clone(), key.clone());
        let chain = self.chains.entry(key).or_default();
        let at = chain.partition_point(|t| t.order_key() <= trace.order_key());
        chain.insert(at, trace);
        Ok(())
    }

    /// The chain holding `trace` and the entry's position in it.
    fn locate(&self, trace: &Trace) -> Result<(&[Trace], usize)> {
        let not_found = || StoreError::TraceNotFound {
            id: trace.id().clone(),
        };
        let key = self.index.get(trace.id()).ok_or_else(not_found)?;
        let chain = self.chains.get(key).ok_or_else(not_found)?;
        let position = chain
            .iter()
            .position(|t| t.id() == trace.id())
            .ok_or_else(not_found)?;
        Ok((chain.as_slice(), position))
    }
}

/// A thread-safe in-memory [`TraceStore`].
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) state: RwLock<ChainState>,
}

impl InMemory {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored traces.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.index.len())
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Saves every chain to `path` as JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path)
    }

    /// Loads a store saved with [`save_to_file`](Self::save_to_file).
    ///
    /// A missing file yields an empty store.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path)
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, ChainState>> {
        self.state
            .read()
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ChainState>> {
        self.state
            .write()
            .map_err(|_| StoreError::LockPoisoned.into())
    }
}

impl TraceStore for InMemory {
    fn append(&self, mut trace: Trace) -> Result<Trace> {
        let mut state = self.write()?;
        let seq = state.seq + 1;
        trace.assign_seq(seq);
        state.insert(trace.clone())?;
        state.seq = seq;
        tracing::debug!(
            trace_id = %trace.id(),
            model = trace.target_model(),
            seq = trace.seq(),
            "Appended trace"
        );
        Ok(trace)
    }

    fn get(&self, id: &TraceId) -> Result<Trace> {
        let state = self.read()?;
        state
            .index
            .get(id)
            .and_then(|key| state.chains.get(key))
            .and_then(|chain| chain.iter().find(|t| t.id() == id))
            .cloned()
            .ok_or_else(|| StoreError::TraceNotFound { id: id.clone() }.into())
    }

    fn previous(&self, trace: &Trace) -> Result<Option<Trace>> {
        let state = self.read()?;
        let (chain, position) = state.locate(trace)?;
        Ok(position.checked_sub(1).map(|i| chain[i].clone()))
    }

    fn next(&self, trace: &Trace) -> Result<Option<Trace>> {
        let state = self.read()?;
        let (chain, position) = state.locate(trace)?;
        Ok(chain.get(position + 1).cloned())
    }

    fn chain(&self, model: &str, target_id: &Scalar) -> Result<Vec<Trace>> {
        let state = self.read()?;
        Ok(state
            .chains
            .get(&chain_key(model, target_id))
            .cloned()
            .unwrap_or_default())
    }
}
