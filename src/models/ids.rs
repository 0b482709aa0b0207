use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a record in the external note store.
///
/// The store owns the identifier; this type only carries it around so that
/// page ids cannot be confused with database ids or free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Wraps an identifier returned by the store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
