//! Decoded response payloads.
//!
//! Both JSON and XML bodies decode into the same [`Payload`] tree so the
//! normalizers can probe fields uniformly. Every accessor is total: a missing
//! field yields `None`, an empty slice or an empty string, never a panic.
//!
//! XML elements map onto the tree as follows:
//!
//! - an element with only text becomes a `String`, whitespace included
//! - an element with children or attributes becomes a `Map`; attributes are
//!   stored under `@name`, non-blank text (trimmed) under `$text`
//! - repeated child elements with the same name become a `List`
//! - namespace prefixes are dropped (`circ:itemStatus` is `itemStatus`)
//!
//! The document itself is a one-entry map keyed by the root element name.

mod json;
mod xml;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{CatalogError, PayloadFormat};

/// Key under which element text is stored when the element also has children.
pub const TEXT_KEY: &str = "$text";

/// A generic decoded tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Payload>),
    Map(BTreeMap<String, Payload>),
}

/// Decode a raw body in the given format.
///
/// Fails with [`CatalogError::Decode`] on malformed input; no partial tree is
/// ever returned.
pub fn decode(body: &str, format: PayloadFormat) -> Result<Payload, CatalogError> {
    match format {
        PayloadFormat::Json => json::parse(body),
        PayloadFormat::Xml => xml::parse(body),
    }
}

impl Payload {
    /// Child value of a map
    pub fn get(&self, key: &str) -> Option<&Payload> {
        match self {
            Payload::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Walk nested maps along a dotted path, e.g. `"responseHeader.QTime"`
    pub fn get_path(&self, path: &str) -> Option<&Payload> {
        path.split('.')
            .try_fold(self, |node, segment| node.get(segment))
    }

    /// Borrow a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read an unsigned integer from a number or a numeric string
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Payload::Number(n) => n.as_u64(),
            Payload::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read a boolean from a bool or a `"true"`/`"false"` string
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            Payload::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Borrow the map entries
    pub fn as_map(&self) -> Option<&BTreeMap<String, Payload>> {
        match self {
            Payload::Map(map) => Some(map),
            _ => None,
        }
    }

    /// View the value as a sequence.
    ///
    /// Lists yield their elements, `Null` yields nothing, and any other value
    /// yields itself. XML has no way to say "a list of one", so a single
    /// repeated element and a one-element list are treated alike.
    pub fn items(&self) -> Vec<&Payload> {
        match self {
            Payload::List(items) => items.iter().collect(),
            Payload::Null => Vec::new(),
            other => vec![other],
        }
    }

    /// Scalar text of this node.
    ///
    /// Multi-valued fields (lists) yield their first element's text, and XML
    /// elements with children yield their `$text`.
    pub fn text(&self) -> Option<String> {
        match self {
            Payload::Null => None,
            Payload::Bool(b) => Some(b.to_string()),
            Payload::Number(n) => Some(n.to_string()),
            Payload::String(s) => Some(s.clone()),
            Payload::List(items) => items.first().and_then(Payload::text),
            Payload::Map(map) => map.get(TEXT_KEY).and_then(Payload::text),
        }
    }

    /// Text of a child field, or an empty string when absent
    pub fn field_text(&self, key: &str) -> String {
        self.get(key).and_then(Payload::text).unwrap_or_default()
    }

    /// Every node named `name` anywhere below this one.
    ///
    /// Like the XPath expression `//name`, except that map entries are
    /// visited in key order: repeated same-named elements keep document
    /// order, differently named siblings do not.
    pub fn descendants(&self, name: &str) -> Vec<&Payload> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Payload>) {
        match self {
            Payload::Map(map) => {
                for (key, value) in map {
                    if key == name {
                        found.extend(value.items());
                    }
                    value.collect_descendants(name, found);
                }
            }
            Payload::List(items) => {
                for item in items {
                    item.collect_descendants(name, found);
                }
            }
            _ => {}
        }
    }

    /// Select nodes by a slash-separated tag path.
    ///
    /// A leading `//` searches descendants for the first segment; otherwise
    /// the first segment must be a direct child. Later segments always match
    /// direct children. Repeated elements are flattened at every step.
    pub fn select(&self, path: &str) -> Vec<&Payload> {
        let (mut current, rest) = match path.strip_prefix("//") {
            Some(rest) => {
                let mut segments = rest.split('/');
                let first = segments.next().unwrap_or_default();
                (self.descendants(first), segments.collect::<Vec<_>>())
            }
            None => (vec![self], path.split('/').collect::<Vec<_>>()),
        };

        for segment in rest.into_iter().filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .filter_map(|node| node.get(segment))
                .flat_map(Payload::items)
                .collect();
        }
        current
    }

    /// Text of the first node matching `path`, if any
    pub fn select_text(&self, path: &str) -> Option<String> {
        self.select(path).first().and_then(|node| node.text())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Payload::Null,
            serde_json::Value::Bool(b) => Payload::Bool(b),
            serde_json::Value::Number(n) => Payload::Number(n),
            serde_json::Value::String(s) => Payload::String(s),
            serde_json::Value::Array(items) => {
                Payload::List(items.into_iter().map(Payload::from).collect())
            }
            serde_json::Value::Object(map) => Payload::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Payload::from(v)))
                    .collect(),
            ),
        }
    }
}
