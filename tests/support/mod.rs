//! Shared test harness: a scripted [`HttpTransport`] that serves canned
//! responses and records every outbound request for inspection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use omniex::error::{ExchangeError, Result};
use omniex::transport::HttpTransport;
use reqwest::Method;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of a `key=value` pair in a form-encoded body.
    pub fn form_field(&self, name: &str) -> Option<String> {
        let body = self.body.as_deref()?;
        body.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }
}

pub enum Reply {
    /// 2xx with this body.
    Body(&'static str),
    /// Non-2xx surfaced by the transport with this status and body.
    Status(u16, &'static str),
}

/// Serves scripted replies in order and records requests.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(body: &'static str) -> Arc<Self> {
        Self::new(vec![Reply::Body(body)])
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        headers: &[(&str, String)],
    ) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(RecordedRequest {
                method: method.to_string(),
                url: url.to_string(),
                body,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });

        let reply = self
            .replies
            .lock()
            .expect("reply queue poisoned")
            .pop_front();

        match reply {
            Some(Reply::Body(body)) => Ok(body.as_bytes().to_vec()),
            Some(Reply::Status(status, body)) => {
                Err(ExchangeError::transport(Some(status), body))
            }
            None => Err(ExchangeError::transport(None, "scripted transport exhausted")),
        }
    }
}
