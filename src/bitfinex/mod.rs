//! Bitfinex exchange adapter.
//!
//! - [`common`] - payload signing, HTTP client wrapper, rejection unwrapping
//! - [`adapter`] - the [`Bitfinex`] adapter implementing the common contract

pub mod adapter;
pub mod common;

pub use adapter::Bitfinex;
pub use common::{BitfinexAuth, BitfinexRestClient, EXCHANGE_NAME};
