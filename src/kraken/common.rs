use std::sync::Arc;

use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Method;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{ExchangeError, Result};
use crate::traits::OrderStatus;
use crate::transport::HttpTransport;
use crate::utils::NonceFactory;

pub const EXCHANGE_NAME: &str = "kraken.com";
pub const KRAKEN_REST_URL: &str = "https://api.kraken.com";
const API_V0: &str = "/0/";

/// Kraken API credentials.
#[derive(Clone)]
pub struct KrakenAuth {
    pub access_key: String,
    pub secret_key: String,
}

impl KrakenAuth {
    pub fn new(access_key: String, secret_key: String) -> Self {
        Self {
            access_key,
            secret_key,
        }
    }

    /// Generate the HMAC-SHA512 signature for a private REST call.
    ///
    /// The message is `path || SHA256(nonce || postdata)`, keyed with the
    /// base64-decoded secret, and the result is base64-encoded for the
    /// `API-Sign` header. Deterministic for a fixed nonce; a secret that is
    /// not valid base64 is a configuration error raised before any request
    /// goes out.
    pub fn sign_request(&self, path: &str, nonce: u64, postdata: &str) -> Result<String> {
        let secret = general_purpose::STANDARD
            .decode(&self.secret_key)
            .map_err(|e| {
                ExchangeError::Configuration(format!("secret key is not valid base64: {e}"))
            })?;

        let mut sha256 = Sha256::new();
        sha256.update(nonce.to_string().as_bytes());
        sha256.update(postdata.as_bytes());
        let digest = sha256.finalize();

        let mut message = path.as_bytes().to_vec();
        message.extend_from_slice(&digest);

        let mut mac = Hmac::<Sha512>::new_from_slice(&secret)
            .map_err(|e| ExchangeError::Configuration(format!("unusable secret key: {e}")))?;
        mac.update(&message);

        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// HTTP client wrapper for the Kraken REST API.
///
/// Public endpoints are plain GETs under `/0/public/*`; private endpoints
/// are POST-only under `/0/private/*` with `API-Key` and `API-Sign` headers.
pub struct KrakenRestClient {
    transport: Arc<dyn HttpTransport>,
    auth: Option<KrakenAuth>,
    nonce: NonceFactory,
    base_url: String,
}

impl KrakenRestClient {
    pub fn new(transport: Arc<dyn HttpTransport>, auth: Option<KrakenAuth>) -> Self {
        Self {
            transport,
            auth,
            nonce: NonceFactory::new(),
            base_url: KRAKEN_REST_URL.to_string(),
        }
    }

    pub async fn get_public<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut url = format!("{}{}{}", self.base_url, API_V0, endpoint);
        if !params.is_empty() {
            let query = serde_urlencoded::to_string(params)
                .map_err(|e| ExchangeError::protocol(format!("unencodable query: {e}")))?;
            url.push('?');
            url.push_str(&query);
        }

        let body = self.transport.send(Method::GET, &url, None, &[]).await?;
        decode(&body)
    }

    pub async fn post_private<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<T> {
        let auth = self.auth.as_ref().ok_or_else(|| {
            ExchangeError::Configuration("private endpoint requires credentials".to_string())
        })?;

        let nonce = self.nonce.next();
        params.push(("nonce".to_string(), nonce.to_string()));
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let postdata = serde_urlencoded::to_string(&params)
            .map_err(|e| ExchangeError::protocol(format!("unencodable form body: {e}")))?;

        let path = format!("{}{}", API_V0, endpoint);
        let signature = auth.sign_request(&path, nonce, &postdata)?;

        let url = format!("{}{}", self.base_url, path);
        let headers = [
            ("API-Key", auth.access_key.clone()),
            ("API-Sign", signature),
            (
                "Content-Type",
                "application/x-www-form-urlencoded".to_string(),
            ),
        ];

        let body = self
            .transport
            .send(Method::POST, &url, Some(postdata), &headers)
            .await?;
        decode(&body)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T> {
    let envelope: KrakenResponse<T> = serde_json::from_slice(body)
        .map_err(|e| ExchangeError::protocol(format!("unexpected response shape: {e}")))?;
    envelope.into_result()
}

/// Standard Kraken response envelope. A non-empty `error` array is a hard
/// failure regardless of HTTP status.
#[derive(Debug, Deserialize)]
pub struct KrakenResponse<T> {
    #[serde(default)]
    pub error: Vec<String>,
    pub result: Option<T>,
}

impl<T> KrakenResponse<T> {
    pub fn into_result(self) -> Result<T> {
        if !self.error.is_empty() {
            return Err(ExchangeError::Rejected(self.error[0].clone()));
        }
        self.result
            .ok_or_else(|| ExchangeError::protocol("missing result payload"))
    }
}

/// Kraken order status vocabulary mapped onto the canonical lifecycle.
pub(crate) const ORDER_STATUS: &[(&str, OrderStatus)] = &[
    ("open", OrderStatus::Unfinished),
    ("pending", OrderStatus::Unfinished),
    ("expired", OrderStatus::Unfinished),
    ("canceled", OrderStatus::Canceled),
    ("closed", OrderStatus::Canceled),
    ("filled", OrderStatus::Finished),
    ("partialfilled", OrderStatus::PartiallyFinished),
];
