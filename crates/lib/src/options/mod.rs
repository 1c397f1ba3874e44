//! Tracing configuration.
//!
//! Options are resolved per model: each list a model declares is merged with the
//! global list it inherits, keeping the model's own entries first and dropping
//! duplicates. An empty `actions` list traces every action.
//!
//! ```
//! use retrace::TraceOptions;
//!
//! let options = TraceOptions::from_json_str(
//!     r#"{"models": {"Post": {"ignore": ["views"], "references": ["comments"]}}}"#,
//! )
//! .unwrap();
//! let post = options.for_model("Post");
//! assert_eq!(post.ignore, vec!["views", "created_at", "updated_at", "_type"]);
//! assert_eq!(post.references, vec!["comments"]);
//! ```

pub mod errors;

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

pub use errors::OptionsError;

use crate::{Result, constants::DEFAULT_IGNORE};

/// Option lists for one model, or the global defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Attributes never traced.
    pub ignore: Vec<String>,
    /// Extra computed attributes traced as scalars.
    pub include: Vec<String>,
    /// Non-embedded relations that are traced.
    pub references: Vec<String>,
    /// Actions that produce traces; empty means all of them.
    pub actions: Vec<String>,
}

impl ModelOptions {
    /// Merges `self` over `inherited`: own entries first, duplicates dropped.
    fn merged_over(&self, inherited: &ModelOptions) -> ModelOptions {
        ModelOptions {
            ignore: union(&self.ignore, &inherited.ignore),
            include: union(&self.include, &inherited.include),
            references: union(&self.references, &inherited.references),
            actions: union(&self.actions, &inherited.actions),
        }
    }
}

fn union(own: &[String], inherited: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(own.len() + inherited.len());
    for name in own.iter().chain(inherited) {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

fn default_global() -> ModelOptions {
    ModelOptions {
        ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
        ..ModelOptions::default()
    }
}

/// Global defaults plus per-model overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOptions {
    /// Options every model inherits.
    #[serde(default = "default_global")]
    pub global: ModelOptions,
    /// Per-model options, keyed by model name.
    #[serde(default)]
    pub models: BTreeMap<String, ModelOptions>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            global: default_global(),
            models: BTreeMap::new(),
        }
    }
}

impl TraceOptions {
    /// Adds or replaces the options of one model.
    pub fn with_model(mut self, model: impl Into<String>, options: ModelOptions) -> Self {
        self.models.insert(model.into(), options);
        self
    }

    /// Effective options for `model`.
    pub fn for_model(&self, model: &str) -> ModelOptions {
        match self.models.get(model) {
            Some(own) => own.merged_over(&self.global),
            None => self.global.clone(),
        }
    }

    /// Parses options from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| OptionsError::Parse { source }.into())
    }

    /// Reads options from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| OptionsError::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), models = options.models.len(), "Loaded trace options");
        Ok(options)
    }
}
