//! Constants used throughout the Retrace library.
//!
//! Reserved attribute keys live here so that the diff builder, the resolver and the
//! plain-JSON encoding all agree on them.

/// Reserved attribute carrying the identity of a record or nested child.
pub const ID_KEY: &str = "_id";

/// Reserved key marking a subtree as destroyed in the plain-JSON encoding of a diff.
pub const DESTROYED_FLAG: &str = "$destroyed";

/// Attributes that are never traced unless the configuration says otherwise.
pub const DEFAULT_IGNORE: [&str; 3] = ["created_at", "updated_at", "_type"];

/// Suffix marking an action as mandatory: traced even when empty or not configured.
pub const MANDATORY_SUFFIX: char = '!';
