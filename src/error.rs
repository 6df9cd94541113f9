//! Error type shared by the search backend and the ILS driver.
//!
//! Only transport, protocol and decode failures are errors. A well-formed
//! upstream reply that reports failure through an embedded response code is
//! not: it surfaces as an empty list or an unsuccessful result instead.

use std::fmt;

/// Maximum number of body characters kept in a decode error.
const SNIPPET_LEN: usize = 200;

/// Payload formats understood by the response decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Xml,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Json => write!(f, "JSON"),
            PayloadFormat::Xml => write!(f, "XML"),
        }
    }
}

/// Errors that can occur when talking to a catalog or search upstream
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Connection, timeout or body read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success HTTP status
    #[error("Upstream returned HTTP {status}: {message}")]
    Protocol { status: u16, message: String },

    /// Malformed JSON or XML payload
    #[error("{format} decoding error: {message} -- {snippet}")]
    Decode {
        format: PayloadFormat,
        message: String,
        snippet: String,
    },

    /// Request parameters conflict with what the backend requires
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream error refined into something actionable
    #[error("Remote error: {0}")]
    Remote(String),

    /// Patron store failure
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration is missing or unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation is not supported by this driver or backend
    #[error("Operation not implemented")]
    NotImplemented,
}

impl CatalogError {
    /// Build a decode error that carries a bounded excerpt of the raw body.
    pub fn decode(format: PayloadFormat, message: impl Into<String>, body: &str) -> Self {
        CatalogError::Decode {
            format,
            message: message.into(),
            snippet: snippet(body),
        }
    }

    /// HTTP status for protocol errors
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn snippet(body: &str) -> String {
    match body.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode {
            format: PayloadFormat::Json,
            message: err.to_string(),
            snippet: String::new(),
        }
    }
}

impl From<quick_xml::Error> for CatalogError {
    fn from(err: quick_xml::Error) -> Self {
        CatalogError::Decode {
            format: PayloadFormat::Xml,
            message: err.to_string(),
            snippet: String::new(),
        }
    }
}
