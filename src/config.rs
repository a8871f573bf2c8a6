//! Credential manifest loading.
//!
//! Adapters take their `(access key, secret key)` pair at construction time;
//! this module is the thin loader that resolves them from a TOML manifest:
//!
//! ```toml
//! api_version = 1
//!
//! [exchanges."kraken.com"]
//! access_key = "..."
//! secret_key = "..."
//!
//! [exchanges."okcoin.com"]
//! access_key = "..."
//! secret_key = "..."
//! admin_password = "..."
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ExchangeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeKeys {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub api_version: u32,
    #[serde(default)]
    pub exchanges: HashMap<String, ExchangeKeys>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Manifest> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExchangeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Manifest::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Manifest> {
        toml::from_str(raw)
            .map_err(|e| ExchangeError::Configuration(format!("malformed manifest: {e}")))
    }

    /// Looks up credentials by stable exchange name (e.g. `"kraken.com"`).
    pub fn keys(&self, exchange: &str) -> Result<&ExchangeKeys> {
        self.exchanges.get(exchange).ok_or_else(|| {
            ExchangeError::Configuration(format!("no credentials for {exchange}"))
        })
    }
}
