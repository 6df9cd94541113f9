//! Abstract search query.

use serde::{Deserialize, Serialize};

/// Query string used when the caller asks for "everything"
pub const MATCH_ALL: &str = "*:*";

/// A full-text query as seen by the search backend.
///
/// Immutable once built: construct a new one per call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Raw query string in the engine's syntax
    pub string: String,

    /// Optional field/handler the query is scoped to
    pub handler: Option<String>,
}

impl Query {
    /// Create a new query from a raw string
    pub fn new(string: impl Into<String>) -> Self {
        Self {
            string: string.into(),
            handler: None,
        }
    }

    /// Scope the query to a field or handler
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Whether the query string carries no terms
    pub fn is_empty(&self) -> bool {
        self.string.trim().is_empty()
    }
}
