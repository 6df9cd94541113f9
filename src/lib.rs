//! # Catalog Bridge
//!
//! Clients for the services behind a library discovery layer: a Solr search
//! backend and a Kuali OLE circulation driver.
//!
//! ## Architecture
//!
//! Every operation runs the same pipeline, once per round trip:
//!
//! - [`utils::RequestDescriptor`]: method, endpoint, escaped parameters
//! - [`utils::HttpClient`]: dispatch with a bounded timeout
//! - [`payload`]: decode JSON or XML into a generic tree
//! - [`ils::normalize`] / [`search::record_collection`]: map the tree into
//!   the normalized shapes of [`models`]
//!
//! Operations that need several round trips ([`search::SolrBackend`] batch
//! retrieval and spellcheck, [`ils::OleDriver`] holdings) issue them one at a
//! time, in order, and fail as a whole if any call fails.
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (records, items, transactions, etc.)
//! - [`search`]: Search backends with a trait-based interface
//! - [`ils`]: Library system drivers with a trait-based interface
//! - [`payload`]: Generic decoded payload tree
//! - [`utils`]: HTTP transport and table output
//! - [`config`]: Configuration management

pub mod config;
pub mod error;
pub mod ils;
pub mod models;
pub mod payload;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use error::{CatalogError, PayloadFormat};
pub use ils::{IlsDriver, OleDriver};
pub use models::{ParamBag, Query, RecordCollection};
pub use payload::Payload;
pub use search::{SearchBackend, SolrBackend};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
