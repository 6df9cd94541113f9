//! HTTP transport: dispatch one request descriptor with a bounded timeout.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::request::{HttpMethod, RequestDescriptor};
use crate::config::HttpConfig;
use crate::error::CatalogError;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept in a protocol error message
const MAX_ERROR_BODY: usize = 500;

/// Undecoded upstream reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// Whether the HTTP status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP client with a fixed timeout policy.
///
/// Non-2xx statuses become [`CatalogError::Protocol`]. A 2xx reply is always
/// handed back as-is, even when its payload reports a logical failure: the
/// circulation service answers 200 for refused operations and only the
/// embedded response code tells the truth, so that decision belongs to the
/// normalizers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_settings(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a new HTTP client with a custom user agent and timeout
    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    /// Create a client from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, CatalogError> {
        Self::with_settings(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Configured per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one request and return the raw reply
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, CatalogError> {
        let url = request.url();
        tracing::debug!(method = %request.method, url = %url, "Dispatching upstream request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.timeout(self.timeout).send().await.map_err(|e| {
            CatalogError::Transport(format!("{} {} failed: {}", request.method, url, e))
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                body.trim().chars().take(MAX_ERROR_BODY).collect()
            };
            return Err(CatalogError::Protocol {
                status: status.as_u16(),
                message,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_execute_returns_body_for_logical_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/circulation")
            .match_query(Matcher::UrlEncoded("service".into(), "renewItem".into()))
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body("<renewItem><code>010</code><message>Refused</message></renewItem>")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let request = RequestDescriptor::post(format!("{}/circulation", server.url()))
            .param("service", "renewItem");
        let raw = client.execute(&request).await.unwrap();

        mock.assert_async().await;
        assert!(raw.is_success());
        assert_eq!(raw.content_type.as_deref(), Some("application/xml"));
        assert!(raw.body.contains("Refused"));
    }

    #[tokio::test]
    async fn test_execute_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/select")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("undefined field foo")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let request = RequestDescriptor::get(format!("{}/select", server.url())).param("q", "foo:1");
        let err = client.execute(&request).await.unwrap_err();

        match err {
            CatalogError::Protocol { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "undefined field foo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_connection_refused_is_transport() {
        let client = HttpClient::with_settings("test", Duration::from_secs(2)).unwrap();
        let request = RequestDescriptor::get("http://127.0.0.1:1/select");
        let err = client.execute(&request).await.unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
    }
}
