//! The outbound HTTP seam.
//!
//! Adapters never talk to the network directly; they go through
//! [`HttpTransport`], a deliberately narrow "send a request, get bytes back"
//! interface. Production uses [`ReqwestTransport`]; tests inject a scripted
//! implementation to exercise the adapters offline.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, Method};
use tracing::debug;

use crate::error::{ExchangeError, Result};
use crate::traits::UnixMillis;

#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request and returns the raw response body.
    ///
    /// Connection failures, timeouts and non-2xx responses all surface as
    /// [`ExchangeError::Transport`]; the status code and response body ride
    /// along so callers can inspect venue rejections delivered over 4xx.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        headers: &[(&str, String)],
    ) -> Result<Vec<u8>>;
}

/// [`HttpTransport`] backed by a pooled [`reqwest::Client`].
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        ReqwestTransport {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        headers: &[(&str, String)],
    ) -> Result<Vec<u8>> {
        debug!(%method, url, "sending request");

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::transport(None, e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExchangeError::transport(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(ExchangeError::transport(
                Some(status.as_u16()),
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        Ok(bytes.to_vec())
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> UnixMillis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
