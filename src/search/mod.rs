//! Search engine backends.
//!
//! The [`SearchBackend`] trait translates abstract queries into engine calls
//! and returns normalized [`RecordCollection`]s. [`SolrBackend`] is the
//! implementation for Solr cores that speak the JSON response writer.
//!
//! # Multi-step operations
//!
//! Some operations need more than one round trip. They are always issued
//! one at a time, in order, and any failing call aborts the whole operation:
//!
//! - `retrieve_batch` splits identifiers into pages of [`BATCH_PAGE_SIZE`]
//!   and concatenates the pages in order
//! - `search` with spellcheck enabled queries each additional dictionary and
//!   merges its suggestions into the primary collection

mod collection;
mod connector;
mod solr;

pub use collection::{query_time, record_collection, spellcheck, terms};
pub use connector::{escape_phrase, Connector, QueryBuilder, SentQuery};
pub use solr::{SolrBackend, BATCH_PAGE_SIZE, DEFAULT_BROWSE_LIMIT};

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::models::{ParamBag, Query, RecordCollection, Terms};
use crate::payload::Payload;

bitflags::bitflags! {
    /// Operations a search backend supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BackendCapabilities: u32 {
        const SEARCH = 1 << 0;
        const RETRIEVE = 1 << 1;
        const RETRIEVE_BATCH = 1 << 2;
        const SIMILAR = 1 << 3;
        const TERMS = 1 << 4;
        const ALPHABETIC_BROWSE = 1 << 5;
    }
}

/// Interface of a search engine backend.
///
/// Only `identifier` and `search` are required; the other operations report
/// [`CatalogError::NotImplemented`] unless the backend advertises them in
/// [`SearchBackend::capabilities`].
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    /// Identifier stamped on every returned collection
    fn identifier(&self) -> Option<&str>;

    /// Describe the capabilities of this backend
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::SEARCH
    }

    /// Perform a search
    async fn search(
        &self,
        query: &Query,
        offset: u64,
        limit: u64,
        params: Option<ParamBag>,
    ) -> Result<RecordCollection, CatalogError>;

    /// Retrieve a single document
    async fn retrieve(
        &self,
        _id: &str,
        _params: Option<ParamBag>,
    ) -> Result<RecordCollection, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Retrieve many documents, preserving page order
    async fn retrieve_batch(
        &self,
        _ids: &[String],
        _params: Option<ParamBag>,
    ) -> Result<RecordCollection, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Documents similar to the given one
    async fn similar(
        &self,
        _id: &str,
        _params: Option<ParamBag>,
    ) -> Result<RecordCollection, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Index terms of a field starting after `start`
    async fn terms(
        &self,
        _field: &str,
        _start: &str,
        _limit: u64,
        _params: Option<ParamBag>,
    ) -> Result<Terms, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// A page of an alphabetic browse index
    async fn alphabetic_browse(
        &self,
        _source: &str,
        _from: &str,
        _page: u64,
        _limit: u64,
        _params: Option<ParamBag>,
    ) -> Result<Payload, CatalogError> {
        Err(CatalogError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_capabilities() {
        let caps = BackendCapabilities::SEARCH | BackendCapabilities::TERMS;

        assert!(caps.contains(BackendCapabilities::SEARCH));
        assert!(caps.contains(BackendCapabilities::TERMS));
        assert!(!caps.contains(BackendCapabilities::ALPHABETIC_BROWSE));
    }
}
