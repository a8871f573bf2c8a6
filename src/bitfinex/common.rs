use std::sync::Arc;

use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::Sha384;

use crate::error::{ExchangeError, Result};
use crate::transport::HttpTransport;
use crate::utils::NonceFactory;

pub const EXCHANGE_NAME: &str = "bitfinex.com";
pub const BITFINEX_REST_URL: &str = "https://api.bitfinex.com";

/// Bitfinex API credentials.
#[derive(Clone)]
pub struct BitfinexAuth {
    pub access_key: String,
    pub secret_key: String,
}

impl BitfinexAuth {
    pub fn new(access_key: String, secret_key: String) -> Self {
        Self {
            access_key,
            secret_key,
        }
    }

    /// Generate the HMAC-SHA384 signature (hex) over the base64 payload for
    /// the `X-BFX-SIGNATURE` header. Deterministic for a fixed payload.
    pub fn sign_payload(&self, payload_b64: &str) -> Result<String> {
        let mut mac = Hmac::<Sha384>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ExchangeError::Configuration(format!("unusable secret key: {e}")))?;
        mac.update(payload_b64.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// HTTP client wrapper for the Bitfinex v1 REST API.
///
/// There is no success envelope; failures arrive either as a 4xx body of
/// `{"message": "..."}` or, for some flows, as a `status` field inside an
/// otherwise well-formed payload. The 4xx shape is unwrapped here so venue
/// rejections surface as [`ExchangeError::Rejected`] rather than transport
/// faults.
pub struct BitfinexRestClient {
    transport: Arc<dyn HttpTransport>,
    auth: Option<BitfinexAuth>,
    nonce: NonceFactory,
    base_url: String,
}

impl BitfinexRestClient {
    pub fn new(transport: Arc<dyn HttpTransport>, auth: Option<BitfinexAuth>) -> Self {
        Self {
            transport,
            auth,
            nonce: NonceFactory::new(),
            base_url: BITFINEX_REST_URL.to_string(),
        }
    }

    pub async fn get_public<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let body = self
            .transport
            .send(Method::GET, &url, None, &[])
            .await
            .map_err(surface_rejection)?;
        decode(&body)
    }

    pub async fn post_private<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        mut params: Map<String, Value>,
    ) -> Result<T> {
        let auth = self.auth.as_ref().ok_or_else(|| {
            ExchangeError::Configuration("private endpoint requires credentials".to_string())
        })?;

        params.insert("request".to_string(), Value::String(path.to_string()));
        params.insert(
            "nonce".to_string(),
            Value::String(self.nonce.next().to_string()),
        );

        let json = Value::Object(params).to_string();
        let payload = general_purpose::STANDARD.encode(&json);
        let signature = auth.sign_payload(&payload)?;

        let url = format!("{}{}", self.base_url, path);
        let headers = [
            ("X-BFX-APIKEY", auth.access_key.clone()),
            ("X-BFX-PAYLOAD", payload),
            ("X-BFX-SIGNATURE", signature),
            ("Content-Type", "application/json".to_string()),
        ];

        let body = self
            .transport
            .send(Method::POST, &url, Some(json), &headers)
            .await
            .map_err(surface_rejection)?;
        decode(&body)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| ExchangeError::protocol(format!("unexpected response shape: {e}")))
}

#[derive(Debug, Deserialize)]
struct BfxErrorBody {
    message: String,
}

/// A 4xx with a `{"message": ...}` body is the venue talking, not the
/// network; re-classify it as a rejection with the message verbatim.
fn surface_rejection(err: ExchangeError) -> ExchangeError {
    if let ExchangeError::Transport {
        status: Some(code),
        message,
    } = &err
    {
        if (400..500).contains(code) {
            if let Ok(body) = serde_json::from_str::<BfxErrorBody>(message) {
                return ExchangeError::Rejected(body.message);
            }
        }
    }
    err
}
