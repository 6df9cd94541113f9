//! Request descriptors: what to send, described as plain data.

use std::fmt;

use crate::models::ParamBag;

/// HTTP method of an upstream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Reads
    Get,
    /// State-changing operations (holds, renewals)
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// An immutable description of one upstream call.
///
/// Parameters travel in the query string for both methods; the upstream
/// services read them from there even on POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Endpoint URL without query string
    pub endpoint: String,
    pub params: ParamBag,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Describe a GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    /// Describe a POST request
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: ParamBag::new(),
            headers: Vec::new(),
        }
    }

    /// Set a query parameter, replacing earlier values
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Use these parameters
    pub fn params(mut self, params: ParamBag) -> Self {
        self.params = params;
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Ask the upstream for JSON explicitly
    pub fn accept_json(self) -> Self {
        self.header("Accept", "application/json")
    }

    /// Ask the upstream for XML explicitly
    pub fn accept_xml(self) -> Self {
        self.header("Accept", "application/xml")
    }

    /// Fully qualified URL with the escaped query string
    pub fn url(&self) -> String {
        if self.params.is_empty() {
            return self.endpoint.clone();
        }
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.endpoint, separator, self.params.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_escapes_parameters() {
        let request = RequestDescriptor::post("http://localhost:8080/olefs/circulation")
            .param("service", "placeRequest")
            .param("patronId", "10100055U")
            .param("requestType", "Page/Hold Request");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url(),
            "http://localhost:8080/olefs/circulation?service=placeRequest&patronId=10100055U&requestType=Page%2FHold%20Request"
        );
    }

    #[test]
    fn test_url_without_params() {
        let request = RequestDescriptor::get("http://solr/select").accept_json();
        assert_eq!(request.url(), "http://solr/select");
        assert_eq!(request.headers, vec![("Accept".to_string(), "application/json".to_string())]);
    }

    #[test]
    fn test_url_appends_to_existing_query() {
        let request = RequestDescriptor::get("http://docstore/document?format=json").param("bibIds", "1");
        assert_eq!(request.url(), "http://docstore/document?format=json&bibIds=1");
    }
}
