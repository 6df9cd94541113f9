//! Low-level Solr connector: builds and sends handler requests.

use crate::config::SearchConfig;
use crate::error::CatalogError;
use crate::models::{ParamBag, Query, MATCH_ALL};
use crate::utils::{HttpClient, RequestDescriptor};

/// Handler used for searches, retrievals and resubmissions
const SELECT_HANDLER: &str = "select";

/// Request handler name for more-like-this queries
const MORE_LIKE_THIS: &str = "morelikethis";

/// Escape a value for use inside a double-quoted phrase
pub fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Turns an abstract [`Query`] into engine parameters
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the `q` parameter.
    ///
    /// An empty query matches everything; a handler scopes the query to that
    /// field.
    pub fn build(&self, query: &Query) -> ParamBag {
        let q = if query.is_empty() {
            MATCH_ALL.to_string()
        } else {
            match query.handler.as_deref().filter(|h| !h.is_empty()) {
                Some(handler) => format!("{}:({})", handler, query.string),
                None => query.string.clone(),
            }
        };
        ParamBag::from_pairs([("q", q)])
    }
}

/// A reply together with the parameters that were actually sent
#[derive(Debug, Clone)]
pub struct SentQuery {
    pub params: ParamBag,
    pub body: String,
}

/// Sends requests to the handlers of one Solr core
#[derive(Debug, Clone)]
pub struct Connector {
    url: String,
    client: HttpClient,
    invariants: ParamBag,
    unique_key: String,
}

impl Connector {
    /// Create a connector for the core at `url`
    pub fn new(url: impl Into<String>, client: HttpClient) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            client,
            invariants: ParamBag::new(),
            unique_key: "id".to_string(),
        }
    }

    /// Create a connector from the `[search]` configuration section
    pub fn from_config(config: &SearchConfig, client: HttpClient) -> Self {
        Self::new(config.url.clone(), client)
            .with_invariants(config.invariant_params())
            .with_unique_key(config.unique_key.clone())
    }

    /// Parameters merged into every query
    pub fn with_invariants(mut self, invariants: ParamBag) -> Self {
        self.invariants = invariants;
        self
    }

    /// Field holding the document key
    pub fn with_unique_key(mut self, unique_key: impl Into<String>) -> Self {
        self.unique_key = unique_key.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn unique_key(&self) -> &str {
        &self.unique_key
    }

    pub fn query_invariants(&self) -> &ParamBag {
        &self.invariants
    }

    /// Execute a search
    pub async fn search(
        &self,
        query: &Query,
        offset: u64,
        limit: u64,
        builder: &QueryBuilder,
        mut params: ParamBag,
    ) -> Result<SentQuery, CatalogError> {
        params.set("start", offset.to_string());
        params.set("rows", limit.to_string());
        params.merge_with(&builder.build(query));
        self.query(SELECT_HANDLER, params).await
    }

    /// Fetch one document by its unique key
    pub async fn retrieve(&self, id: &str, mut params: ParamBag) -> Result<SentQuery, CatalogError> {
        params.set("q", self.key_query(id));
        self.query(SELECT_HANDLER, params).await
    }

    /// Fetch documents similar to the given one
    pub async fn similar(&self, id: &str, mut params: ParamBag) -> Result<SentQuery, CatalogError> {
        params.set("q", self.key_query(id));
        params.set("qt", MORE_LIKE_THIS);
        self.query(SELECT_HANDLER, params).await
    }

    /// Send parameters to a handler, adding the query invariants
    pub async fn query(&self, handler: &str, mut params: ParamBag) -> Result<SentQuery, CatalogError> {
        params.merge_with(&self.invariants);
        self.send(handler, params).await
    }

    /// Send fully prepared parameters to the select handler as-is
    pub async fn resubmit(&self, params: ParamBag) -> Result<SentQuery, CatalogError> {
        self.send(SELECT_HANDLER, params).await
    }

    fn key_query(&self, id: &str) -> String {
        format!("{}:\"{}\"", self.unique_key, escape_phrase(id))
    }

    async fn send(&self, handler: &str, params: ParamBag) -> Result<SentQuery, CatalogError> {
        let request = RequestDescriptor::get(format!("{}/{}", self.url, handler))
            .params(params.clone())
            .accept_json();
        let raw = self.client.execute(&request).await?;
        Ok(SentQuery {
            params,
            body: raw.body,
        })
    }
}
