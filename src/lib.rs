//! Unified trading adapters for cryptocurrency exchange REST APIs.
//!
//! Every exchange speaks its own dialect: symbol conventions, signing
//! schemes, field names, error vocabularies. This crate absorbs that
//! heterogeneity behind one contract. Callers pick an adapter by venue,
//! issue exchange-agnostic operations through the [`traits::Exchange`]
//! trait, and get back the canonical domain types regardless of which
//! exchange served the call.
//!
//! ```ignore
//! use std::sync::Arc;
//! use omniex::currency::BTC_USD;
//! use omniex::kraken::Kraken;
//! use omniex::traits::Exchange;
//! use omniex::transport::ReqwestTransport;
//!
//! #[tokio::main]
//! async fn main() -> omniex::Result<()> {
//!     let transport = Arc::new(ReqwestTransport::new());
//!     let kraken = Kraken::new(transport, access_key, secret_key);
//!
//!     let ticker = kraken.get_ticker(&BTC_USD).await?;
//!     println!("last: {}", ticker.last);
//!     Ok(())
//! }
//! ```
//!
//! Private calls are signed per venue (HMAC-SHA512, HMAC-SHA384 or legacy
//! MD5, each with its own message layout) with strictly increasing nonces,
//! and every response is normalized: books are re-sorted, venue status
//! strings collapse onto a four-state order lifecycle, and upstream
//! failures map onto the [`error::ExchangeError`] taxonomy.

pub mod config;
pub mod currency;
pub mod error;
pub mod traits;
pub mod transport;
pub mod utils;

pub mod bitfinex;
pub mod kraken;
pub mod okcoin;

pub use currency::{Currency, CurrencyPair};
pub use error::{ExchangeError, Result};
pub use traits::{
    Account, CryptoAddress, Depth, DepthRecord, Exchange, Kline, KlineInterval, Order, OrderKind,
    OrderStatus, SubAccount, Ticker, Trade, TradeSide, Withdraw, WithdrawRecord,
};
pub use transport::{HttpTransport, ReqwestTransport};

pub use bitfinex::Bitfinex;
pub use kraken::Kraken;
pub use okcoin::OkCoinCom;
