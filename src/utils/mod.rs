//! Utility modules supporting upstream calls and CLI output.
//!
//! - [`RequestDescriptor`]: immutable description of one upstream call
//! - [`HttpClient`]: dispatches a descriptor with a bounded timeout
//! - [`display`]: table rendering for the command line
//!
//! # Dispatching a request
//!
//! ```rust,no_run
//! use catalog_bridge::utils::{HttpClient, RequestDescriptor};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let request = RequestDescriptor::get("http://localhost:8080/solr/biblio/select")
//!     .param("q", "*:*")
//!     .param("wt", "json")
//!     .accept_json();
//! let raw = client.execute(&request).await?;
//! println!("{} bytes", raw.body.len());
//! # Ok(())
//! # }
//! ```

pub mod display;
mod http;
mod request;

pub use http::{HttpClient, RawResponse, DEFAULT_TIMEOUT_SECS};
pub use request::{HttpMethod, RequestDescriptor};
