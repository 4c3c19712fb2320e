//! Transport seam for the BI server REST API.
//!
//! `Transport` is the injection point: production code runs on
//! [`RestTransport`], tests may substitute anything that can answer with a
//! [`ServerReply`]. Reachability problems never cross this seam as errors;
//! they surface as an absent reply and are classified downstream.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

/// What came back from the server, reduced to what the callers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReply {
    pub status: u16,
    /// `None` when the body could not be read.
    pub body: Option<String>,
}

/// Issues requests against the server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand out a builder bound to this transport's client handle.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder;

    /// Execute the request. `None` means the server could not be reached.
    async fn send(&self, request: reqwest::RequestBuilder) -> Option<ServerReply>;
}

/// Production transport over a lazily-created `reqwest` client.
#[derive(Default)]
pub struct RestTransport {
    http_client: OnceCell<reqwest::Client>,
}

impl RestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized client handle, created on first use. The same instance
    /// is reused for every request on this transport.
    pub fn http_client(&self) -> &reqwest::Client {
        self.http_client
            .get_or_init(|| reqwest::Client::builder().gzip(true).build().unwrap())
    }
}

#[async_trait]
impl Transport for RestTransport {
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http_client().request(method, url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Option<ServerReply> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("server unreachable: {e}");
                return None;
            }
        };
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("unreadable response body: {e}");
                None
            }
        };
        Some(ServerReply { status, body })
    }
}

/// Strict UTF-8 percent-encoding for query values.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Form-style variant: spaces become `+`. The delete-by-name endpoint
/// expects this exact convention and must not receive `%20`.
pub fn form_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
