//! Search records and record collections.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::payload::Payload;

/// A single document returned by the search engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Unique key of the document (never empty)
    pub id: String,

    /// Identifier of the backend that produced the record
    pub source_identifier: Option<String>,

    /// Stored fields as returned by the engine
    pub fields: BTreeMap<String, Payload>,
}

impl NormalizedRecord {
    /// Create a record with no stored fields
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_identifier: None,
            fields: BTreeMap::new(),
        }
    }

    /// Text of a stored field, first value for multi-valued fields
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(Payload::text)
    }

    /// Title, when the index stores one
    pub fn title(&self) -> Option<String> {
        self.field_text("title")
    }
}

/// One misspelled term and its suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellingSuggestion {
    /// The term as it appeared in the query
    pub term: String,

    /// Number of suggestions the engine found
    pub num_found: u64,

    /// Suggested replacements, best first
    pub suggestions: Vec<String>,
}

/// Aggregated spelling suggestions, mergeable across responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Spellcheck {
    /// The spellcheck query the suggestions belong to
    pub query: Option<String>,

    /// Suggestions in the order first seen
    pub suggestions: Vec<SpellingSuggestion>,
}

impl Spellcheck {
    /// Whether the term already has suggestions
    pub fn contains(&self, term: &str) -> bool {
        self.suggestions.iter().any(|s| s.term == term)
    }

    /// Merge another block into this one.
    ///
    /// Terms already present keep their existing suggestions; new terms are
    /// appended in the order they appear in `other`.
    pub fn merge_with(&mut self, other: Spellcheck) {
        if self.query.is_none() {
            self.query = other.query;
        }
        for suggestion in other.suggestions {
            if !self.contains(&suggestion.term) {
                self.suggestions.push(suggestion);
            }
        }
    }

    /// Number of terms with suggestions
    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    /// Whether no suggestions were collected
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Ordered search results plus auxiliary data
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordCollection {
    /// Records in engine order
    pub records: Vec<NormalizedRecord>,

    /// Total number of matching documents reported by the engine
    pub total: u64,

    /// Offset of the first record
    pub offset: u64,

    /// Engine-reported query time in milliseconds
    pub query_time: Option<u64>,

    /// Spelling suggestions
    pub spellcheck: Spellcheck,

    /// Identifier of the backend that produced the collection
    pub source_identifier: Option<String>,
}

impl RecordCollection {
    /// A collection that matched nothing
    pub fn empty(source_identifier: Option<String>) -> Self {
        Self {
            source_identifier,
            ..Default::default()
        }
    }

    /// Append a record, keeping order
    pub fn add(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    /// Tag the collection and every record with a backend identifier
    pub fn set_source_identifier(&mut self, identifier: Option<&str>) {
        self.source_identifier = identifier.map(str::to_string);
        for record in &mut self.records {
            record.source_identifier = self.source_identifier.clone();
        }
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are held
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record identifiers in order
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }
}

/// A term and how many documents contain it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

/// Index terms per field, in index order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Terms {
    pub fields: BTreeMap<String, Vec<TermCount>>,
}

impl Terms {
    /// Terms for one field
    pub fn field(&self, name: &str) -> &[TermCount] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}
