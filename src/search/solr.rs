//! Solr implementation of [`SearchBackend`].

use async_trait::async_trait;

use super::collection::{query_time, record_collection, terms};
use super::connector::{escape_phrase, Connector, QueryBuilder};
use super::{BackendCapabilities, SearchBackend};
use crate::config::Config;
use crate::error::{CatalogError, PayloadFormat};
use crate::models::{ParamBag, Query, RecordCollection, Terms, MATCH_ALL};
use crate::payload::{self, Payload};
use crate::utils::HttpClient;

/// Identifiers fetched per request in `retrieve_batch`
pub const BATCH_PAGE_SIZE: usize = 100;

/// Default page size for alphabetic browse
pub const DEFAULT_BROWSE_LIMIT: u64 = 20;

const RESPONSE_WRITER: &str = "json";
const NAMED_LIST_MODE: &str = "arrarr";

/// Upstream messages that mean the browse index was never built
const MISSING_BROWSE_INDEX: [&str; 3] = ["does not exist", "no such table", "couldn't find a browse index"];

/// Search backend for a Solr core
#[derive(Debug)]
pub struct SolrBackend {
    connector: Connector,
    query_builder: QueryBuilder,
    dictionaries: Vec<String>,
    identifier: Option<String>,
}

impl SolrBackend {
    pub fn new(connector: Connector) -> Self {
        Self {
            connector,
            query_builder: QueryBuilder::new(),
            dictionaries: Vec::new(),
            identifier: None,
        }
    }

    /// Build a backend from the `[http]` and `[search]` sections
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let client = HttpClient::from_config(&config.http)?;
        Ok(Self::new(Connector::from_config(&config.search, client))
            .with_identifier(config.search.identifier.clone())
            .with_dictionaries(config.search.dictionaries.clone()))
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Spellcheck dictionaries; the first is used by the primary query
    pub fn with_dictionaries(mut self, dictionaries: Vec<String>) -> Self {
        self.dictionaries = dictionaries;
        self
    }

    pub fn with_query_builder(mut self, query_builder: QueryBuilder) -> Self {
        self.query_builder = query_builder;
        self
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.query_builder
    }

    /// Query matching any of the given keys
    pub fn batch_query(&self, ids: &[String]) -> Query {
        let quoted: Vec<String> = ids.iter().map(|id| format!("\"{}\"", escape_phrase(id))).collect();
        Query::new(format!("{}:({})", self.connector.unique_key(), quoted.join(" OR ")))
    }

    /// Force the JSON response writer and list-of-pairs named lists.
    ///
    /// Any other value already present is rejected rather than overwritten.
    fn inject_response_writer(params: &mut ParamBag) -> Result<(), CatalogError> {
        if let Some(values) = params.get("wt") {
            if values.iter().any(|v| v != RESPONSE_WRITER) {
                return Err(CatalogError::InvalidArgument(format!(
                    "Invalid response writer type: {}",
                    values.join(", ")
                )));
            }
        }
        if let Some(values) = params.get("json.nl") {
            if values.iter().any(|v| v != NAMED_LIST_MODE) {
                return Err(CatalogError::InvalidArgument(format!(
                    "Invalid named list implementation type: {}",
                    values.join(", ")
                )));
            }
        }
        params.set("wt", RESPONSE_WRITER);
        params.set("json.nl", NAMED_LIST_MODE);
        Ok(())
    }

    fn deserialize(&self, body: &str) -> Result<Payload, CatalogError> {
        let payload = payload::decode(body, PayloadFormat::Json)?;
        let qtime = query_time(&payload).map_or_else(|| "n/a".to_string(), |q| q.to_string());
        tracing::debug!(qtime = %qtime, "Deserialized Solr response");
        Ok(payload)
    }

    fn create_record_collection(&self, body: &str) -> Result<RecordCollection, CatalogError> {
        let payload = self.deserialize(body)?;
        Ok(record_collection(&payload, self.connector.unique_key()))
    }

    fn inject_source_identifier(&self, collection: &mut RecordCollection) {
        collection.set_source_identifier(self.identifier.as_deref());
    }

    fn refine_browse_error(err: CatalogError) -> CatalogError {
        match err {
            CatalogError::Protocol { status, message }
                if MISSING_BROWSE_INDEX.iter().any(|marker| message.contains(marker)) =>
            {
                CatalogError::Remote(format!(
                    "Alphabetic browse index missing (HTTP {}). Generate the browse index before browsing.",
                    status
                ))
            }
            other => other,
        }
    }
}

#[async_trait]
impl SearchBackend for SolrBackend {
    fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::all()
    }

    async fn search(
        &self,
        query: &Query,
        offset: u64,
        limit: u64,
        params: Option<ParamBag>,
    ) -> Result<RecordCollection, CatalogError> {
        let mut params = params.unwrap_or_default();
        Self::inject_response_writer(&mut params)?;

        if params.has("spellcheck.q") {
            match self.dictionaries.first() {
                Some(dictionary) => {
                    params.set("spellcheck", "true");
                    params.set("spellcheck.dictionary", dictionary.clone());
                }
                None => tracing::warn!("Spellcheck requested but no spellcheck dictionary configured"),
            }
        }

        let sent = self
            .connector
            .search(query, offset, limit, &self.query_builder, params)
            .await?;
        let mut collection = self.create_record_collection(&sent.body)?;
        if collection.spellcheck.query.is_none() {
            collection.spellcheck.query = sent.params.get_first("spellcheck.q").map(str::to_string);
        }
        self.inject_source_identifier(&mut collection);

        // Skip secondary dictionaries if the primary query ran without spellcheck
        if sent.params.get_first("spellcheck") != Some("true") {
            return Ok(collection);
        }

        for dictionary in self.dictionaries.iter().skip(1) {
            let mut next = ParamBag::from_pairs([("q", MATCH_ALL), ("spellcheck", "true"), ("rows", "0")]);
            Self::inject_response_writer(&mut next)?;
            next.merge_with(self.connector.query_invariants());
            if let Some(values) = sent.params.get("spellcheck.q") {
                next.set_all("spellcheck.q", values.to_vec());
            }
            next.set("spellcheck.dictionary", dictionary.clone());

            let reply = self.connector.resubmit(next).await?;
            let supplementary = self.create_record_collection(&reply.body)?;
            collection.spellcheck.merge_with(supplementary.spellcheck);
        }

        Ok(collection)
    }

    async fn retrieve(&self, id: &str, params: Option<ParamBag>) -> Result<RecordCollection, CatalogError> {
        let mut params = params.unwrap_or_default();
        Self::inject_response_writer(&mut params)?;

        let sent = self.connector.retrieve(id, params).await?;
        let mut collection = self.create_record_collection(&sent.body)?;
        self.inject_source_identifier(&mut collection);
        Ok(collection)
    }

    async fn retrieve_batch(
        &self,
        ids: &[String],
        params: Option<ParamBag>,
    ) -> Result<RecordCollection, CatalogError> {
        let mut results: Option<RecordCollection> = None;

        for page in ids.chunks(BATCH_PAGE_SIZE) {
            let query = self.batch_query(page);
            let next = self
                .search(&query, 0, BATCH_PAGE_SIZE as u64, params.clone())
                .await?;
            results = Some(match results.take() {
                None => next,
                Some(mut acc) => {
                    acc.total += next.total;
                    acc.records.extend(next.records);
                    acc
                }
            });
        }

        Ok(results.unwrap_or_else(|| RecordCollection::empty(self.identifier.clone())))
    }

    async fn similar(&self, id: &str, params: Option<ParamBag>) -> Result<RecordCollection, CatalogError> {
        let mut params = params.unwrap_or_default();
        Self::inject_response_writer(&mut params)?;

        let sent = self.connector.similar(id, params).await?;
        let mut collection = self.create_record_collection(&sent.body)?;
        self.inject_source_identifier(&mut collection);
        Ok(collection)
    }

    async fn terms(
        &self,
        field: &str,
        start: &str,
        limit: u64,
        params: Option<ParamBag>,
    ) -> Result<Terms, CatalogError> {
        let mut params = params.unwrap_or_default();
        Self::inject_response_writer(&mut params)?;

        params.set("terms", "true");
        params.set("terms.fl", field);
        params.set("terms.lower", start);
        params.set("terms.limit", limit.to_string());
        params.set("terms.lower.incl", "false");
        params.set("terms.sort", "index");

        let sent = self.connector.query("term", params).await?;
        Ok(terms(&self.deserialize(&sent.body)?))
    }

    async fn alphabetic_browse(
        &self,
        source: &str,
        from: &str,
        page: u64,
        limit: u64,
        params: Option<ParamBag>,
    ) -> Result<Payload, CatalogError> {
        let mut params = params.unwrap_or_default();
        Self::inject_response_writer(&mut params)?;

        params.set("from", from);
        params.set("offset", page.saturating_mul(limit).to_string());
        params.set("rows", limit.to_string());
        params.set("source", source);

        let sent = self
            .connector
            .query("browse", params)
            .await
            .map_err(Self::refine_browse_error)?;
        self.deserialize(&sent.body)
    }
}
