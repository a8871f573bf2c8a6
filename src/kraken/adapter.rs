//! Kraken spot trading adapter.
//!
//! Dialect notes: pair symbols use `XBT` for Bitcoin and no separator
//! (`XBTUSD`), while balance keys carry legacy one-letter asset-class
//! prefixes (`XXBT`, `ZUSD`) that are stripped before registry lookup.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::currency::{self, Currency, CurrencyPair};
use crate::error::{ExchangeError, Result};
use crate::kraken::common::{KrakenAuth, KrakenRestClient, EXCHANGE_NAME, ORDER_STATUS};
use crate::traits::{
    Account, CryptoAddress, Depth, DepthRecord, Exchange, Order, OrderKind, OrderStatus,
    SubAccount, Ticker, TradeSide, UnixMillis, Withdraw, WithdrawRecord,
};
use crate::transport::{now_millis, HttpTransport};
use crate::utils::num::{lenient_str_f64, strict_f64, strict_str_f64};

pub struct Kraken {
    client: KrakenRestClient,
}

impl Kraken {
    pub fn new(transport: Arc<dyn HttpTransport>, access_key: String, secret_key: String) -> Self {
        let auth = KrakenAuth::new(access_key, secret_key);
        Self {
            client: KrakenRestClient::new(transport, Some(auth)),
        }
    }

    /// Renders Bitcoin as XBT on either side of the pair; everything else
    /// passes through.
    fn convert_pair(pair: &CurrencyPair) -> CurrencyPair {
        if pair.base == currency::BTC {
            return CurrencyPair::new(currency::XBT, pair.quote.clone());
        }
        if pair.quote == currency::BTC {
            return CurrencyPair::new(pair.base.clone(), currency::XBT);
        }
        pair.clone()
    }

    /// Maps a balance key like `XXBT` or `ZUSD` back to a registry currency
    /// by stripping one `X` and one `Z` from four-letter-and-up keys.
    fn convert_currency(raw: &str) -> Currency {
        let mut symbol = raw.to_string();
        if symbol.len() >= 4 {
            if let Some(pos) = symbol.find('X') {
                symbol.remove(pos);
            }
            if let Some(pos) = symbol.find('Z') {
                symbol.remove(pos);
            }
        }
        Currency::new(&symbol, "")
    }

    fn convert_side(raw: &str) -> TradeSide {
        match raw {
            "buy" => TradeSide::Buy,
            _ => TradeSide::Sell,
        }
    }

    fn order_from_details(
        order_id: &str,
        details: &KrakenOrderDetails,
        pair: &CurrencyPair,
    ) -> Result<Order> {
        Ok(Order {
            pair: pair.clone(),
            side: Self::convert_side(&details.descr.side),
            amount: strict_str_f64(&details.vol, "vol")?,
            price: strict_str_f64(&details.descr.price, "descr.price")?,
            deal_amount: strict_str_f64(&details.vol_exec, "vol_exec")?,
            avg_price: strict_str_f64(&details.price, "price")?,
            status: OrderStatus::from_raw(ORDER_STATUS, &details.status),
            order_id: order_id.to_string(),
            order_time_ms: (details.opentm * 1000.0) as UnixMillis,
            raw_status: Some(details.status.clone()),
        })
    }

    /// Safe default row for a malformed record inside a batch fetch. The id
    /// is preserved so the caller can re-query it individually.
    fn degraded_order(order_id: &str, pair: &CurrencyPair) -> Order {
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

    /// Poll the status of past withdrawals for one asset.
    pub async fn withdraw_status(&self, currency: &Currency) -> Result<Vec<WithdrawRecord>> {
        let params = vec![("asset".to_string(), currency.symbol().to_string())];
        let rows: Vec<KrakenWithdrawStatusRow> =
            self.client.post_private("private/WithdrawStatus", params).await?;

        Ok(rows
            .into_iter()
            .map(|row| WithdrawRecord {
                method: row.method,
                currency: Self::convert_currency(&row.asset),
                ref_id: row.refid,
                txid: row.txid,
                amount: lenient_str_f64(&row.amount),
                status: row.status,
            })
            .collect())
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct KrakenAddOrderResult {
    txid: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KrakenCancelResult {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct KrakenOrderDetails {
    status: String,
    descr: KrakenOrderDescr,
    vol: String,
    vol_exec: String,
    /// Average executed price.
    price: String,
    opentm: f64,
}

#[derive(Debug, Deserialize)]
struct KrakenOrderDescr {
    #[serde(rename = "type")]
    side: String,
    /// Requested price.
    price: String,
}

#[derive(Debug, Deserialize)]
struct KrakenOpenOrders {
    open: HashMap<String, KrakenOrderDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct KrakenTickerData {
    #[serde(default)]
    a: Vec<String>,
    #[serde(default)]
    b: Vec<String>,
    #[serde(default)]
    c: Vec<String>,
    #[serde(default)]
    v: Vec<String>,
    #[serde(default)]
    l: Vec<String>,
    #[serde(default)]
    h: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KrakenDepthLevels {
    #[serde(default)]
    asks: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    bids: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct KrakenWithdrawResult {
    refid: String,
}

#[derive(Debug, Deserialize)]
struct KrakenWithdrawStatusRow {
    #[serde(default)]
    method: String,
    asset: String,
    refid: String,
    #[serde(default)]
    txid: Option<String>,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    status: String,
}

fn depth_side(levels: &[Vec<serde_json::Value>], side: &str) -> Result<Vec<DepthRecord>> {
    levels
        .iter()
        .map(|level| {
            let price = level
                .first()
                .ok_or_else(|| ExchangeError::protocol(format!("empty {side} level")))
                .and_then(|v| strict_f64(v, &format!("{side} price")))?;
            let amount = level
                .get(1)
                .ok_or_else(|| ExchangeError::protocol(format!("truncated {side} level")))
                .and_then(|v| strict_f64(v, &format!("{side} amount")))?;
            Ok(DepthRecord { price, amount })
        })
        .collect()
}

// ============================================================================
// Exchange implementation
// ============================================================================

#[async_trait::async_trait]
impl Exchange for Kraken {
    fn exchange_name(&self) -> &'static str {
        EXCHANGE_NAME
    }

    async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker> {
        let symbol = Self::convert_pair(pair).to_symbol("");
        let result: HashMap<String, KrakenTickerData> = self
            .client
            .get_public("public/Ticker", &[("pair", symbol)])
            .await?;

        let data = result
            .into_values()
            .next()
            .ok_or_else(|| ExchangeError::protocol("empty ticker result"))?;

        let first = |values: &[String]| values.first().map(|s| lenient_str_f64(s)).unwrap_or(0.0);

        Ok(Ticker {
            last: first(&data.c),
            buy: first(&data.b),
            sell: first(&data.a),
            low: first(&data.l),
            high: first(&data.h),
            vol: first(&data.v),
            ts_ms: now_millis(),
        })
    }

    async fn get_depth(&self, size: usize, pair: &CurrencyPair) -> Result<Depth> {
        let symbol = Self::convert_pair(pair).to_symbol("");
        let result: HashMap<String, KrakenDepthLevels> = self
            .client
            .get_public(
                "public/Depth",
                &[("pair", symbol), ("count", size.to_string())],
            )
            .await?;

        let levels = result
            .into_values()
            .next()
            .ok_or_else(|| ExchangeError::protocol("empty depth result"))?;

        Ok(Depth::from_unsorted(
            depth_side(&levels.asks, "ask")?,
            depth_side(&levels.bids, "bid")?,
        ))
    }

    async fn get_account(&self) -> Result<Account> {
        let balances: HashMap<String, String> =
            self.client.post_private("private/Balance", Vec::new()).await?;

        let mut account = Account {
            exchange: EXCHANGE_NAME.to_string(),
            ..Account::default()
        };

        for (key, raw_amount) in balances {
            let amount = strict_str_f64(&raw_amount, &key)?;
            let currency = Self::convert_currency(&key);

            if currency == currency::XBT {
                // Balances come back under the XBT spelling; surface the
                // canonical BTC entry as well so callers can join across
                // exchanges without knowing the dialect.
                account.sub_accounts.insert(
                    currency::BTC,
                    SubAccount {
                        currency: currency::BTC,
                        amount,
                        frozen_amount: 0.0,
                        loan_amount: 0.0,
                    },
                );
            }

            account.sub_accounts.insert(
                currency.clone(),
                SubAccount {
                    currency,
                    amount,
                    frozen_amount: 0.0,
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
        let kind_str = match kind {
            OrderKind::Limit => "limit",
            OrderKind::Market => "market",
        };

        let params = vec![
            (
                "pair".to_string(),
                Self::convert_pair(pair).to_symbol(""),
            ),
            ("type".to_string(), side_str.to_string()),
            ("ordertype".to_string(), kind_str.to_string()),
            ("price".to_string(), price.to_string()),
            ("volume".to_string(), amount.to_string()),
        ];

        let result: KrakenAddOrderResult =
            self.client.post_private("private/AddOrder", params).await?;

        let order_id = result
            .txid
            .first()
            .ok_or_else(|| ExchangeError::protocol("order accepted without a txid"))?
            .clone();

        Ok(Order {
            pair: pair.clone(),
            side,
            amount,
            price,
            deal_amount: 0.0,
            avg_price: 0.0,
            status: OrderStatus::Unfinished,
            order_id,
            order_time_ms: now_millis(),
            raw_status: None,
        })
    }

    async fn cancel_order(&self, order_id: &str, _pair: &CurrencyPair) -> Result<bool> {
        let params = vec![("txid".to_string(), order_id.to_string())];
        let result: KrakenCancelResult = self
            .client
            .post_private("private/CancelOrder", params)
            .await?;
        Ok(result.count > 0)
    }

    async fn get_order_info(&self, order_id: &str, pair: &CurrencyPair) -> Result<Order> {
        let params = vec![("txid".to_string(), order_id.to_string())];
        let result: HashMap<String, KrakenOrderDetails> = self
            .client
            .post_private("private/QueryOrders", params)
            .await?;

        let (txid, details) = result
            .iter()
            .next()
            .ok_or_else(|| ExchangeError::NotFound(order_id.to_string()))?;

        Self::order_from_details(txid, details, pair)
    }

    async fn get_unfinished_orders(&self, pair: &CurrencyPair) -> Result<Vec<Order>> {
        let result: KrakenOpenOrders = self
            .client
            .post_private("private/OpenOrders", Vec::new())
            .await?;

        let mut orders = Vec::with_capacity(result.open.len());
        for (txid, details) in &result.open {
            match Self::order_from_details(txid, details, pair) {
                Ok(order) => orders.push(order),
                Err(e) => {
                    warn!(order_id = %txid, error = %e, "degrading malformed open order");
                    orders.push(Self::degraded_order(txid, pair));
                }
            }
        }

        Ok(orders)
    }

    async fn withdraw(
        &self,
        pair: &CurrencyPair,
        address: &dyn CryptoAddress,
        amount: f64,
        _wallet: &str,
        _admin_password: &str,
    ) -> Result<Withdraw> {
        // Kraken withdraws to pre-registered named keys; the destination tag
        // carries the key name and the literal address is unused.
        let params = vec![
            ("amount".to_string(), amount.to_string()),
            ("asset".to_string(), pair.base.symbol().to_string()),
            ("key".to_string(), address.tag().to_string()),
        ];

        let result: KrakenWithdrawResult =
            self.client.post_private("private/Withdraw", params).await?;

        Ok(Withdraw {
            ref_id: result.refid,
        })
    }
}
