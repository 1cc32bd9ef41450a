use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque external identifier for one geographic unit (a census GEOID, a
/// precinct code, or whatever external key the adjacency file was keyed on).
///
/// Cheap to clone: the underlying text is shared via `Arc<str>` rather than
/// duplicated per submission row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(Arc<str>);

impl UnitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        UnitId(Arc::from(s))
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        UnitId(Arc::from(s))
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
