//! Kraken exchange adapter.
//!
//! - [`common`] - authentication, HTTP client wrapper, response envelope
//! - [`adapter`] - the [`Kraken`] adapter implementing the common contract

pub mod adapter;
pub mod common;

pub use adapter::Kraken;
pub use common::{KrakenAuth, KrakenRestClient, EXCHANGE_NAME};
