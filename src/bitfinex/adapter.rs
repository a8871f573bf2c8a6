//! Bitfinex v1 adapter.
//!
//! Dialect notes: instruments are concatenated lower-case (`ethbtc`), every
//! numeric arrives as a string, and order lifecycle is expressed through
//! `is_live`/`is_cancelled` flags plus executed amounts rather than a status
//! vocabulary.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::bitfinex::common::{BitfinexAuth, BitfinexRestClient, EXCHANGE_NAME};
use crate::currency::{Currency, CurrencyPair};
use crate::error::{ExchangeError, Result};
use crate::traits::{
    Account, CryptoAddress, Depth, DepthRecord, Exchange, Order, OrderKind, OrderStatus,
    SubAccount, Ticker, TradeSide, UnixMillis, Withdraw,
};
use crate::transport::{now_millis, HttpTransport};
use crate::utils::num::{lenient_str_f64, strict_str_f64};

/// Withdrawal method names the v1 API expects per currency.
const WITHDRAW_TYPES: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("LTC", "litecoin"),
    ("ETH", "ethereum"),
    ("ETC", "ethereumc"),
    ("ZEC", "zcash"),
    ("XMR", "monero"),
    ("IOTA", "iota"),
];

pub struct Bitfinex {
    client: BitfinexRestClient,
}

impl Bitfinex {
    pub fn new(transport: Arc<dyn HttpTransport>, access_key: String, secret_key: String) -> Self {
        let auth = BitfinexAuth::new(access_key, secret_key);
        Self {
            client: BitfinexRestClient::new(transport, Some(auth)),
        }
    }

    fn symbol(pair: &CurrencyPair) -> String {
        pair.to_symbol("").to_lowercase()
    }

    fn convert_side(raw: &str) -> TradeSide {
        match raw {
            "buy" => TradeSide::Buy,
            _ => TradeSide::Sell,
        }
    }

    fn status_from_flags(is_cancelled: bool, is_live: bool, executed: f64) -> OrderStatus {
        if is_cancelled {
            OrderStatus::Canceled
        } else if is_live && executed > 0.0 {
            OrderStatus::PartiallyFinished
        } else if is_live {
            OrderStatus::Unfinished
        } else {
            OrderStatus::Finished
        }
    }

    fn withdraw_type(currency: &Currency) -> String {
        WITHDRAW_TYPES
            .iter()
            .find(|(symbol, _)| *symbol == currency.symbol())
            .map(|(_, method)| method.to_string())
            .unwrap_or_else(|| currency.symbol().to_lowercase())
    }

    fn parse_order_id(order_id: &str) -> Result<i64> {
        order_id.parse().map_err(|_| {
            ExchangeError::protocol(format!("order id is not numeric: {order_id:?}"))
        })
    }

    fn order_from_status(status: &BfxOrderStatus, pair: &CurrencyPair) -> Result<Order> {
        let executed = strict_str_f64(&status.executed_amount, "executed_amount")?;
        Ok(Order {
            pair: pair.clone(),
            side: Self::convert_side(&status.side),
            amount: strict_str_f64(&status.original_amount, "original_amount")?,
            price: strict_str_f64(&status.price, "price")?,
            deal_amount: executed,
            avg_price: strict_str_f64(&status.avg_execution_price, "avg_execution_price")?,
            status: Self::status_from_flags(status.is_cancelled, status.is_live, executed),
            order_id: status.id.to_string(),
            order_time_ms: (lenient_str_f64(&status.timestamp) * 1000.0) as UnixMillis,
            raw_status: Some(format!(
                "is_live={} is_cancelled={}",
                status.is_live, status.is_cancelled
            )),
        })
    }

    fn degraded_order(order_id: i64, pair: &CurrencyPair) -> Order {
        Order {
            pair: pair.clone(),
            side: TradeSide::Sell,
            amount: 0.0,
            price: 0.0,
            deal_amount: 0.0,
            avg_price: 0.0,
            status: OrderStatus::Unfinished,
            order_id: order_id.to_string(),
            order_time_ms: 0,
            raw_status: None,
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct BfxTicker {
    #[serde(default)]
    bid: String,
    #[serde(default)]
    ask: String,
    #[serde(default)]
    last_price: String,
    #[serde(default)]
    low: String,
    #[serde(default)]
    high: String,
    #[serde(default)]
    volume: String,
    #[serde(default)]
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct BfxBookEntry {
    price: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct BfxBook {
    #[serde(default)]
    bids: Vec<BfxBookEntry>,
    #[serde(default)]
    asks: Vec<BfxBookEntry>,
}

#[derive(Debug, Deserialize)]
struct BfxBalance {
    #[serde(rename = "type")]
    wallet: String,
    currency: String,
    amount: String,
    available: String,
}

#[derive(Debug, Deserialize)]
struct BfxOrderStatus {
    id: i64,
    side: String,
    price: String,
    avg_execution_price: String,
    executed_amount: String,
    original_amount: String,
    #[serde(default)]
    timestamp: String,
    is_live: bool,
    is_cancelled: bool,
}

#[derive(Debug, Deserialize)]
struct BfxWithdrawRow {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    withdrawal_id: Value,
}

// ============================================================================
// Exchange implementation
// ============================================================================

#[async_trait::async_trait]
impl Exchange for Bitfinex {
    fn exchange_name(&self) -> &'static str {
        EXCHANGE_NAME
    }

    async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker> {
        let path = format!("/v1/pubticker/{}", Self::symbol(pair));
        let ticker: BfxTicker = self.client.get_public(&path).await?;

        Ok(Ticker {
            last: lenient_str_f64(&ticker.last_price),
            buy: lenient_str_f64(&ticker.bid),
            sell: lenient_str_f64(&ticker.ask),
            low: lenient_str_f64(&ticker.low),
            high: lenient_str_f64(&ticker.high),
            vol: lenient_str_f64(&ticker.volume),
            ts_ms: (lenient_str_f64(&ticker.timestamp) * 1000.0) as UnixMillis,
        })
    }

    async fn get_depth(&self, size: usize, pair: &CurrencyPair) -> Result<Depth> {
        let path = format!(
            "/v1/book/{}?limit_asks={size}&limit_bids={size}",
            Self::symbol(pair)
        );
        let book: BfxBook = self.client.get_public(&path).await?;

        let convert = |entries: &[BfxBookEntry], side: &str| -> Result<Vec<DepthRecord>> {
            entries
                .iter()
                .map(|entry| {
                    Ok(DepthRecord {
                        price: strict_str_f64(&entry.price, &format!("{side} price"))?,
                        amount: strict_str_f64(&entry.amount, &format!("{side} amount"))?,
                    })
                })
                .collect()
        };

        Ok(Depth::from_unsorted(
            convert(&book.asks, "ask")?,
            convert(&book.bids, "bid")?,
        ))
    }

    async fn get_account(&self) -> Result<Account> {
        let balances: Vec<BfxBalance> =
            self.client.post_private("/v1/balances", Map::new()).await?;

        let mut account = Account {
            exchange: EXCHANGE_NAME.to_string(),
            ..Account::default()
        };

        for balance in balances.iter().filter(|b| b.wallet == "exchange") {
            let total = strict_str_f64(&balance.amount, "amount")?;
            let available = strict_str_f64(&balance.available, "available")?;
            let currency = Currency::new(&balance.currency, "");

            account.sub_accounts.insert(
                currency.clone(),
                SubAccount {
                    currency,
                    amount: available,
                    frozen_amount: total - available,
                    loan_amount: 0.0,
                },
            );
        }

        Ok(account)
    }

    async fn place_order(
        &self,
        side: TradeSide,
        kind: OrderKind,
        amount: f64,
        price: f64,
        pair: &CurrencyPair,
    ) -> Result<Order> {
        let side_str = match side {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        };
        let type_str = match kind {
            OrderKind::Limit => "exchange limit",
            OrderKind::Market => "exchange market",
        };

        let mut params = Map::new();
        params.insert("symbol".to_string(), json!(Self::symbol(pair)));
        params.insert("amount".to_string(), json!(amount.to_string()));
        params.insert("price".to_string(), json!(price.to_string()));
        params.insert("exchange".to_string(), json!("bitfinex"));
        params.insert("side".to_string(), json!(side_str));
        params.insert("type".to_string(), json!(type_str));

        let status: BfxOrderStatus = self.client.post_private("/v1/order/new", params).await?;

        Ok(Order {
            pair: pair.clone(),
            side,
            amount,
            price,
            deal_amount: 0.0,
            avg_price: 0.0,
            status: OrderStatus::Unfinished,
            order_id: status.id.to_string(),
            order_time_ms: now_millis(),
            raw_status: None,
        })
    }

    async fn cancel_order(&self, order_id: &str, _pair: &CurrencyPair) -> Result<bool> {
        let mut params = Map::new();
        params.insert("order_id".to_string(), json!(Self::parse_order_id(order_id)?));

        let _: Value = self.client.post_private("/v1/order/cancel", params).await?;
        Ok(true)
    }

    async fn get_order_info(&self, order_id: &str, pair: &CurrencyPair) -> Result<Order> {
        let mut params = Map::new();
        params.insert("order_id".to_string(), json!(Self::parse_order_id(order_id)?));

        let status: BfxOrderStatus = self
            .client
            .post_private("/v1/order/status", params)
            .await
            .map_err(|e| match e {
                ExchangeError::Rejected(msg) if msg.to_lowercase().contains("not be found") => {
                    ExchangeError::NotFound(order_id.to_string())
                }
                other => other,
            })?;

        Self::order_from_status(&status, pair)
    }

    async fn get_unfinished_orders(&self, pair: &CurrencyPair) -> Result<Vec<Order>> {
        let rows: Vec<BfxOrderStatus> = self.client.post_private("/v1/orders", Map::new()).await?;

        let orders = rows
            .iter()
            .map(|row| {
                Self::order_from_status(row, pair).unwrap_or_else(|e| {
                    warn!(order_id = row.id, error = %e, "degrading malformed open order");
                    Self::degraded_order(row.id, pair)
                })
            })
            .collect();

        Ok(orders)
    }

    async fn get_order_history(
        &self,
        pair: &CurrencyPair,
        _page: usize,
        page_size: usize,
    ) -> Result<Vec<Order>> {
        // The v1 history endpoint only supports a row limit, not paging.
        let mut params = Map::new();
        params.insert("limit".to_string(), json!(page_size));

        let rows: Vec<BfxOrderStatus> =
            self.client.post_private("/v1/orders/hist", params).await?;

        let orders = rows
            .iter()
            .map(|row| {
                Self::order_from_status(row, pair).unwrap_or_else(|e| {
                    warn!(order_id = row.id, error = %e, "degrading malformed order row");
                    Self::degraded_order(row.id, pair)
                })
            })
            .collect();

        Ok(orders)
    }

    async fn withdraw(
        &self,
        pair: &CurrencyPair,
        address: &dyn CryptoAddress,
        amount: f64,
        wallet: &str,
        _admin_password: &str,
    ) -> Result<Withdraw> {
        let mut params = Map::new();
        params.insert(
            "withdraw_type".to_string(),
            json!(Self::withdraw_type(&pair.base)),
        );
        params.insert("walletselected".to_string(), json!(wallet));
        params.insert("amount".to_string(), json!(amount.to_string()));
        params.insert("address".to_string(), json!(address.address()));

        let rows: Vec<BfxWithdrawRow> = self.client.post_private("/v1/withdraw", params).await?;
        let row = rows
            .first()
            .ok_or_else(|| ExchangeError::protocol("empty withdraw result"))?;

        if row.status != "success" {
            return Err(ExchangeError::Rejected(row.message.clone()));
        }

        let ref_id = match &row.withdrawal_id {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => {
                return Err(ExchangeError::protocol(format!(
                    "missing withdrawal id: {other}"
                )))
            }
        };

        Ok(Withdraw { ref_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{BTC, ETH_BTC, XMR};

    #[test]
    fn symbols_are_concatenated_lower_case() {
        assert_eq!(Bitfinex::symbol(&ETH_BTC), "ethbtc");
    }

    #[test]
    fn lifecycle_flags_resolve_to_the_four_states() {
        assert_eq!(
            Bitfinex::status_from_flags(true, false, 0.5),
            OrderStatus::Canceled
        );
        assert_eq!(
            Bitfinex::status_from_flags(false, true, 0.5),
            OrderStatus::PartiallyFinished
        );
        assert_eq!(
            Bitfinex::status_from_flags(false, true, 0.0),
            OrderStatus::Unfinished
        );
        assert_eq!(
            Bitfinex::status_from_flags(false, false, 1.0),
            OrderStatus::Finished
        );
    }

    #[test]
    fn withdraw_methods_fall_back_to_the_symbol() {
        assert_eq!(Bitfinex::withdraw_type(&BTC), "bitcoin");
        assert_eq!(Bitfinex::withdraw_type(&XMR), "monero");
        assert_eq!(
            Bitfinex::withdraw_type(&Currency::new("NEWCOIN", "")),
            "newcoin"
        );
    }
}
