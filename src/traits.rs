use std::collections::HashMap;

use crate::currency::{Currency, CurrencyPair};
use crate::error::{ExchangeError, Result};

pub type UnixMillis = u64;

// ============================================================================
// Market data
// ============================================================================

/// A 24h ticker snapshot. Fields mirror the upstream feed; `low <= high` is
/// not enforced because upstream data may violate it and adapters must not
/// repair it silently.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ticker {
    pub last: f64,
    pub buy: f64,
    pub sell: f64,
    pub low: f64,
    pub high: f64,
    pub vol: f64,
    pub ts_ms: UnixMillis,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthRecord {
    pub price: f64,
    pub amount: f64,
}

/// An order book snapshot. `asks` ascend by price, `bids` descend; the
/// constructor enforces the ordering so callers never have to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Depth {
    pub asks: Vec<DepthRecord>,
    pub bids: Vec<DepthRecord>,
}

impl Depth {
    /// Builds a book from levels in whatever order the exchange returned
    /// them, sorting asks ascending and bids descending by price.
    pub fn from_unsorted(mut asks: Vec<DepthRecord>, mut bids: Vec<DepthRecord>) -> Depth {
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        Depth { asks, bids }
    }
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderKind {
    Limit,
    Market,
}

/// Canonical order lifecycle. `Unfinished` may move to any other state,
/// `PartiallyFinished` to `Finished` or `Canceled`; `Finished` and
/// `Canceled` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderStatus {
    #[default]
    Unfinished,
    PartiallyFinished,
    Finished,
    Canceled,
}

impl OrderStatus {
    /// Resolves an exchange-native status string against a per-exchange
    /// lookup table. Unrecognized strings map to `Unfinished` so one odd
    /// record never poisons a batch fetch.
    pub fn from_raw(table: &[(&str, OrderStatus)], raw: &str) -> OrderStatus {
        table
            .iter()
            .find(|(key, _)| *key == raw)
            .map(|(_, status)| *status)
            .unwrap_or(OrderStatus::Unfinished)
    }
}

#[derive(Clone, Debug)]
pub struct Order {
    pub pair: CurrencyPair,
    pub side: TradeSide,
    pub amount: f64,
    pub price: f64,
    pub deal_amount: f64,
    pub avg_price: f64,
    pub status: OrderStatus,
    pub order_id: String,
    pub order_time_ms: UnixMillis,
    /// Exchange-native status string, kept for diagnostics only. Callers
    /// must branch on `status`, never on this.
    pub raw_status: Option<String>,
}

// ============================================================================
// Account
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct SubAccount {
    pub currency: Currency,
    pub amount: f64,
    pub frozen_amount: f64,
    pub loan_amount: f64,
}

/// A full balance snapshot, rebuilt wholesale on every fetch. One
/// [`SubAccount`] per distinct currency.
#[derive(Clone, Debug, Default)]
pub struct Account {
    pub exchange: String,
    pub asset: f64,
    pub net_asset: f64,
    pub sub_accounts: HashMap<Currency, SubAccount>,
}

// ============================================================================
// Withdrawals
// ============================================================================

/// Result of a submitted withdrawal, keyed by the exchange reference id.
#[derive(Clone, Debug, PartialEq)]
pub struct Withdraw {
    pub ref_id: String,
}

/// One row of a withdrawal status poll.
#[derive(Clone, Debug)]
pub struct WithdrawRecord {
    pub method: String,
    pub currency: Currency,
    pub ref_id: String,
    pub txid: Option<String>,
    pub amount: f64,
    pub status: String,
}

// ============================================================================
// Historical data
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KlineInterval {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

#[derive(Clone, Debug)]
pub struct Kline {
    pub pair: CurrencyPair,
    pub ts_ms: UnixMillis,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Clone, Debug)]
pub struct Trade {
    pub pair: CurrencyPair,
    pub price: f64,
    pub amount: f64,
    pub side: TradeSide,
    pub ts_ms: UnixMillis,
}

// ============================================================================
// External collaborators
// ============================================================================

/// A resolved withdrawal destination. Withdraw flows consume this through
/// the trait only; how the address book is populated is out of scope.
pub trait CryptoAddress: Send + Sync {
    fn currency(&self) -> Currency;
    fn address(&self) -> &str;
    /// Destination tag, memo, or named withdrawal key, depending on venue.
    fn tag(&self) -> &str;
    fn exchange_name(&self) -> &str;
}

/// A static in-memory address, mostly useful in tests.
#[derive(Clone, Debug)]
pub struct StaticAddress {
    pub currency: Currency,
    pub address: String,
    pub tag: String,
    pub exchange_name: String,
}

impl CryptoAddress for StaticAddress {
    fn currency(&self) -> Currency {
        self.currency.clone()
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn exchange_name(&self) -> &str {
        &self.exchange_name
    }
}

// ============================================================================
// The adapter contract
// ============================================================================

/// The common contract every exchange adapter satisfies.
///
/// Implementations translate instruments into the venue dialect before each
/// request, sign private calls, and normalize every response into the
/// canonical types above. Venue field names and raw status strings never
/// leak to the caller. Operations a venue cannot serve return
/// [`ExchangeError::NotSupported`], never a silent no-op.
#[async_trait::async_trait]
pub trait Exchange: Send + Sync {
    /// Stable venue identifier, e.g. `"kraken.com"`.
    fn exchange_name(&self) -> &'static str;

    async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker>;

    async fn get_depth(&self, size: usize, pair: &CurrencyPair) -> Result<Depth>;

    async fn get_account(&self) -> Result<Account>;

    async fn place_order(
        &self,
        side: TradeSide,
        kind: OrderKind,
        amount: f64,
        price: f64,
        pair: &CurrencyPair,
    ) -> Result<Order>;

    async fn cancel_order(&self, order_id: &str, pair: &CurrencyPair) -> Result<bool>;

    async fn get_order_info(&self, order_id: &str, pair: &CurrencyPair) -> Result<Order>;

    async fn get_unfinished_orders(&self, pair: &CurrencyPair) -> Result<Vec<Order>>;

    async fn get_order_history(
        &self,
        _pair: &CurrencyPair,
        _page: usize,
        _page_size: usize,
    ) -> Result<Vec<Order>> {
        Err(ExchangeError::NotSupported {
            exchange: self.exchange_name(),
            operation: "get_order_history",
        })
    }

    async fn withdraw(
        &self,
        pair: &CurrencyPair,
        address: &dyn CryptoAddress,
        amount: f64,
        wallet: &str,
        admin_password: &str,
    ) -> Result<Withdraw>;

    async fn get_kline_records(
        &self,
        _pair: &CurrencyPair,
        _interval: KlineInterval,
        _size: usize,
        _since: Option<UnixMillis>,
    ) -> Result<Vec<Kline>> {
        Err(ExchangeError::NotSupported {
            exchange: self.exchange_name(),
            operation: "get_kline_records",
        })
    }

    async fn get_trades(
        &self,
        _pair: &CurrencyPair,
        _since: Option<UnixMillis>,
    ) -> Result<Vec<Trade>> {
        Err(ExchangeError::NotSupported {
            exchange: self.exchange_name(),
            operation: "get_trades",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(&str, OrderStatus)] = &[
        ("open", OrderStatus::Unfinished),
        ("done", OrderStatus::Finished),
    ];

    #[test]
    fn status_lookup_defaults_to_unfinished() {
        assert_eq!(OrderStatus::from_raw(TABLE, "done"), OrderStatus::Finished);
        assert_eq!(
            OrderStatus::from_raw(TABLE, "???"),
            OrderStatus::Unfinished
        );
    }

    #[test]
    fn depth_constructor_orders_both_sides() {
        let asks = vec![
            DepthRecord { price: 3.0, amount: 1.0 },
            DepthRecord { price: 1.0, amount: 1.0 },
            DepthRecord { price: 2.0, amount: 1.0 },
        ];
        let bids = vec![
            DepthRecord { price: 1.0, amount: 1.0 },
            DepthRecord { price: 3.0, amount: 1.0 },
            DepthRecord { price: 2.0, amount: 1.0 },
        ];
        let depth = Depth::from_unsorted(asks, bids);
        assert!(depth.asks.windows(2).all(|w| w[0].price <= w[1].price));
        assert!(depth.bids.windows(2).all(|w| w[0].price >= w[1].price));
    }
}
