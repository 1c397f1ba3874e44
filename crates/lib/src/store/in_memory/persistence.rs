//! Persistence operations for the InMemory trace store
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory chains to/from JSON files.

use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Deserializer, Serialize};

use super::{ChainState, InMemory};
use crate::{Error, Result, Trace, store::StoreError};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Serializable form of the store: a flat list of traces plus the sequence counter.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    seq: u64,
    traces: Vec<Trace>,
}

/// Saves every stored trace to `path` as pretty JSON.
pub(crate) fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> Result<()> {
    let serializable = {
        let state = store.read()?;
        let mut traces: Vec<Trace> = state.chains.values().flatten().cloned().collect();
        traces.sort_by_key(Trace::seq);
        SerializableStore {
            version: PERSISTENCE_VERSION,
            seq: state.seq,
            traces,
        }
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { StoreError::SerializationFailed { source: e }.into() })?;
    std::fs::write(path.as_ref(), json)
        .map_err(|e| -> Error { StoreError::FileIo { source: e }.into() })?;
    tracing::info!(
        path = %path.as_ref().display(),
        traces = serializable.traces.len(),
        "Saved trace store"
    );
    Ok(())
}

/// Loads a store from `path`; a missing file yields an empty store.
pub(crate) fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match std::fs::read_to_string(path.as_ref()) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(StoreError::FileIo { source: e }.into()),
    };
    let serializable: SerializableStore = serde_json::from_str(&json)
        .map_err(|e| -> Error { StoreError::DeserializationFailed { source: e }.into() })?;

    let mut state = ChainState {
        seq: serializable.seq,
        ..ChainState::default()
    };
    for trace in serializable.traces {
        state.seq = state.seq.max(trace.seq());
        state.insert(trace)?;
    }
    tracing::info!(
        path = %path.as_ref().display(),
        traces = state.index.len(),
        "Loaded trace store"
    );
    Ok(InMemory {
        state: RwLock::new(state),
    })
}
