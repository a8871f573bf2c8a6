use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::currency::{self, Currency, CurrencyPair};
use crate::error::{ExchangeError, Result};
use crate::traits::{
    Account, Depth, DepthRecord, Order, OrderKind, OrderStatus, SubAccount, Ticker, TradeSide,
    UnixMillis, Withdraw,
};
use crate::transport::{now_millis, HttpTransport};
use crate::utils::num::{lenient_f64, strict_f64};

pub const OKCOIN_COM_REST_URL: &str = "https://www.okcoin.com/api/v1/";

const URL_TICKER: &str = "ticker.do";
const URL_DEPTH: &str = "depth.do";
const URL_USERINFO: &str = "userinfo.do";
const URL_TRADE: &str = "trade.do";
const URL_CANCEL_ORDER: &str = "cancel_order.do";
const URL_ORDER_INFO: &str = "order_info.do";
const URL_ORDER_HISTORY: &str = "order_history.do";
const URL_WITHDRAW: &str = "withdraw.do";

/// Numeric order states used by the v1 API. 4 is a cancel request still in
/// flight, which is not terminal.
const ORDER_STATUS: &[(i64, OrderStatus)] = &[
    (-1, OrderStatus::Canceled),
    (0, OrderStatus::Unfinished),
    (1, OrderStatus::PartiallyFinished),
    (2, OrderStatus::Finished),
    (4, OrderStatus::Unfinished),
];

fn status_from_code(code: i64) -> OrderStatus {
    ORDER_STATUS
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, status)| *status)
        .unwrap_or(OrderStatus::Unfinished)
}

/// OKCoin API credentials.
#[derive(Clone)]
pub struct OkCoinAuth {
    pub api_key: String,
    pub secret_key: String,
}

impl OkCoinAuth {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key,
        }
    }

    /// Generate the legacy MD5 signature: upper-case hex digest of the
    /// sorted query string with `&secret_key=...` appended. Deterministic
    /// and infallible; the secret is used verbatim.
    pub fn sign_params(&self, sorted_query: &str) -> String {
        let digest = md5::compute(format!("{sorted_query}&secret_key={}", self.secret_key));
        hex::encode_upper(digest.0)
    }
}

/// Shared OKCoin v1 REST behavior.
///
/// The international and domestic sites expose the same endpoints and
/// signing scheme and differ only in base URL and the fiat side of the
/// balance sheet, so venue adapters hold one of these by composition and
/// override just the differing operation.
pub struct OkCoinRest {
    transport: Arc<dyn HttpTransport>,
    auth: OkCoinAuth,
    base_url: String,
}

impl OkCoinRest {
    pub fn new(transport: Arc<dyn HttpTransport>, auth: OkCoinAuth, base_url: String) -> Self {
        Self {
            transport,
            auth,
            base_url,
        }
    }

    fn symbol(pair: &CurrencyPair) -> String {
        pair.to_symbol("_").to_lowercase()
    }

    async fn get_public<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = serde_urlencoded::to_string(params)
            .map_err(|e| ExchangeError::protocol(format!("unencodable query: {e}")))?;
        let url = format!("{}{}?{}", self.base_url, endpoint, query);

        let body = self.transport.send(Method::GET, &url, None, &[]).await?;
        decode(&body)
    }

    async fn post_private<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<T> {
        params.push(("api_key".to_string(), self.auth.api_key.clone()));
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let sorted_query = serde_urlencoded::to_string(&params)
            .map_err(|e| ExchangeError::protocol(format!("unencodable form body: {e}")))?;
        let signature = self.auth.sign_params(&sorted_query);

        params.push(("sign".to_string(), signature));
        params.sort_by(|a, b| a.0.cmp(&b.0));
        let postdata = serde_urlencoded::to_string(&params)
            .map_err(|e| ExchangeError::protocol(format!("unencodable form body: {e}")))?;

        let url = format!("{}{}", self.base_url, endpoint);
        let headers = [(
            "Content-Type",
            "application/x-www-form-urlencoded".to_string(),
        )];

        let body = self
            .transport
            .send(Method::POST, &url, Some(postdata), &headers)
            .await?;
        decode(&body)
    }

    // ------------------------------------------------------------------
    // Shared operations
    // ------------------------------------------------------------------

    pub async fn ticker(&self, pair: &CurrencyPair) -> Result<Ticker> {
        let response: OkTickerResponse = self
            .get_public(URL_TICKER, &[("symbol", Self::symbol(pair))])
            .await?;

        // The feed timestamps in epoch seconds.
        let ts_ms = (lenient_f64(&response.date) * 1000.0) as UnixMillis;

        Ok(Ticker {
            last: lenient_f64(&response.ticker.last),
            buy: lenient_f64(&response.ticker.buy),
            sell: lenient_f64(&response.ticker.sell),
            low: lenient_f64(&response.ticker.low),
            high: lenient_f64(&response.ticker.high),
            vol: lenient_f64(&response.ticker.vol),
            ts_ms,
        })
    }

    pub async fn depth(&self, size: usize, pair: &CurrencyPair) -> Result<Depth> {
        let response: OkDepthResponse = self
            .get_public(
                URL_DEPTH,
                &[("symbol", Self::symbol(pair)), ("size", size.to_string())],
            )
            .await?;

        Ok(Depth::from_unsorted(
            depth_side(&response.asks, "ask")?,
            depth_side(&response.bids, "bid")?,
        ))
    }

    pub async fn place_order(
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
            OrderKind::Limit => side_str.to_string(),
            OrderKind::Market => format!("{side_str}_market"),
        };

        let params = vec![
            ("symbol".to_string(), Self::symbol(pair)),
            ("type".to_string(), type_str),
            ("price".to_string(), price.to_string()),
            ("amount".to_string(), amount.to_string()),
        ];

        let result: OkTradeResult = self.post_private(URL_TRADE, params).await?;

        Ok(Order {
            pair: pair.clone(),
            side,
            amount,
            price,
            deal_amount: 0.0,
            avg_price: 0.0,
            status: OrderStatus::Unfinished,
            order_id: value_to_id(&result.order_id)?,
            order_time_ms: now_millis(),
            raw_status: None,
        })
    }

    pub async fn cancel_order(&self, order_id: &str, pair: &CurrencyPair) -> Result<bool> {
        let params = vec![
            ("symbol".to_string(), Self::symbol(pair)),
            ("order_id".to_string(), order_id.to_string()),
        ];
        let _: Value = self.post_private(URL_CANCEL_ORDER, params).await?;
        Ok(true)
    }

    pub async fn get_order_info(&self, order_id: &str, pair: &CurrencyPair) -> Result<Order> {
        let rows = self.query_orders(order_id, pair).await?;
        let row = rows
            .first()
            .ok_or_else(|| ExchangeError::NotFound(order_id.to_string()))?;
        order_from_row(row, pair)
    }

    /// The v1 API returns every unfilled order when queried with id `-1`.
    pub async fn unfinished_orders(&self, pair: &CurrencyPair) -> Result<Vec<Order>> {
        let rows = self.query_orders("-1", pair).await?;
        Ok(rows_to_orders(&rows, pair))
    }

    pub async fn order_history(
        &self,
        pair: &CurrencyPair,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Order>> {
        let params = vec![
            ("symbol".to_string(), Self::symbol(pair)),
            ("status".to_string(), "1".to_string()),
            ("current_page".to_string(), page.to_string()),
            ("page_size".to_string(), page_size.to_string()),
        ];

        let result: OkOrdersResult = self.post_private(URL_ORDER_HISTORY, params).await?;
        Ok(rows_to_orders(&result.orders, pair))
    }

    async fn query_orders(&self, order_id: &str, pair: &CurrencyPair) -> Result<Vec<OkOrderRow>> {
        let params = vec![
            ("symbol".to_string(), Self::symbol(pair)),
            ("order_id".to_string(), order_id.to_string()),
        ];

        let result: OkOrdersResult = self.post_private(URL_ORDER_INFO, params).await?;
        Ok(result.orders)
    }

    /// Balance snapshot. The fiat side differs per venue, so the venue
    /// adapter supplies it.
    pub async fn account(&self, exchange: &str, fiat: Currency) -> Result<Account> {
        let result: OkUserInfo = self.post_private(URL_USERINFO, Vec::new()).await?;
        let funds = result.info.funds;

        let mut account = Account {
            exchange: exchange.to_string(),
            asset: strict_f64(&funds.asset.total, "asset.total")?,
            net_asset: strict_f64(&funds.asset.net, "asset.net")?,
            ..Account::default()
        };

        let coins = [
            currency::BTC,
            currency::LTC,
            currency::ETH,
            currency::ETC,
            currency::BCH,
            fiat,
        ];

        for coin in coins {
            let key = coin.symbol().to_lowercase();
            let Some(free) = funds.free.get(&key) else {
                continue;
            };
            let amount = strict_f64(free, &format!("free.{key}"))?;
            let frozen = match funds.freezed.get(&key) {
                Some(value) => strict_f64(value, &format!("freezed.{key}"))?,
                None => 0.0,
            };

            account.sub_accounts.insert(
                coin.clone(),
                SubAccount {
                    currency: coin,
                    amount,
                    frozen_amount: frozen,
                    loan_amount: 0.0,
                },
            );
        }

        Ok(account)
    }

    pub async fn withdraw(
        &self,
        pair: &CurrencyPair,
        address: &str,
        amount: f64,
        admin_password: &str,
    ) -> Result<Withdraw> {
        let params = vec![
            ("symbol".to_string(), Self::symbol(pair)),
            ("withdraw_address".to_string(), address.to_string()),
            ("withdraw_amount".to_string(), amount.to_string()),
            ("trade_pwd".to_string(), admin_password.to_string()),
            ("chargefee".to_string(), "0".to_string()),
        ];

        let result: OkWithdrawResult = self.post_private(URL_WITHDRAW, params).await?;

        Ok(Withdraw {
            ref_id: value_to_id(&result.withdraw_id)?,
        })
    }
}

// ============================================================================
// Response types and row normalization
// ============================================================================

#[derive(Debug, Deserialize)]
struct OkTickerResponse {
    #[serde(default)]
    date: Value,
    ticker: OkTickerData,
}

#[derive(Debug, Deserialize)]
struct OkTickerData {
    #[serde(default)]
    buy: Value,
    #[serde(default)]
    high: Value,
    #[serde(default)]
    last: Value,
    #[serde(default)]
    low: Value,
    #[serde(default)]
    sell: Value,
    #[serde(default)]
    vol: Value,
}

#[derive(Debug, Deserialize)]
struct OkDepthResponse {
    #[serde(default)]
    asks: Vec<Vec<Value>>,
    #[serde(default)]
    bids: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OkTradeResult {
    order_id: Value,
}

#[derive(Debug, Deserialize)]
struct OkWithdrawResult {
    withdraw_id: Value,
}

#[derive(Debug, Deserialize)]
struct OkOrdersResult {
    #[serde(default)]
    orders: Vec<OkOrderRow>,
}

#[derive(Debug, Deserialize)]
struct OkOrderRow {
    order_id: Value,
    #[serde(rename = "type")]
    order_type: String,
    #[serde(default)]
    amount: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    deal_amount: Value,
    #[serde(default)]
    avg_price: Value,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    create_date: Value,
}

#[derive(Debug, Deserialize)]
struct OkUserInfo {
    info: OkFundsInfo,
}

#[derive(Debug, Deserialize)]
struct OkFundsInfo {
    funds: OkFunds,
}

#[derive(Debug, Deserialize)]
struct OkFunds {
    asset: OkAssetTotals,
    #[serde(default)]
    free: std::collections::HashMap<String, Value>,
    #[serde(default)]
    freezed: std::collections::HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct OkAssetTotals {
    #[serde(default)]
    total: Value,
    #[serde(default)]
    net: Value,
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ExchangeError::protocol(format!("unexpected response shape: {e}")))?;

    if let Some(object) = value.as_object() {
        let refused = object.get("result").and_then(Value::as_bool) == Some(false);
        if refused || object.contains_key("error_code") {
            return Err(ExchangeError::Rejected(error_code_string(object)));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ExchangeError::protocol(format!("unexpected response shape: {e}")))
}

/// The v1 API reports failures as numeric codes; surface them verbatim as
/// the canonical message, matching the venue's own documentation keys.
fn error_code_string(object: &serde_json::Map<String, Value>) -> String {
    match object.get("error_code") {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|code| code.to_string())
            .unwrap_or_else(|| n.to_string()),
        Some(Value::String(s)) => s.clone(),
        _ => "unspecified error".to_string(),
    }
}

fn value_to_id(value: &Value) -> Result<String> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        other => Err(ExchangeError::protocol(format!(
            "missing exchange-assigned id: {other}"
        ))),
    }
}

fn depth_side(levels: &[Vec<Value>], side: &str) -> Result<Vec<DepthRecord>> {
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

fn convert_side(order_type: &str) -> TradeSide {
    if order_type.starts_with("buy") {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    }
}

fn order_from_row(row: &OkOrderRow, pair: &CurrencyPair) -> Result<Order> {
    let status_code = row
        .status
        .as_i64()
        .ok_or_else(|| ExchangeError::protocol("order status is not an integer"))?;

    Ok(Order {
        pair: pair.clone(),
        side: convert_side(&row.order_type),
        amount: strict_f64(&row.amount, "amount")?,
        price: strict_f64(&row.price, "price")?,
        deal_amount: strict_f64(&row.deal_amount, "deal_amount")?,
        avg_price: strict_f64(&row.avg_price, "avg_price")?,
        status: status_from_code(status_code),
        order_id: value_to_id(&row.order_id)?,
        order_time_ms: lenient_f64(&row.create_date) as UnixMillis,
        raw_status: Some(status_code.to_string()),
    })
}

fn rows_to_orders(rows: &[OkOrderRow], pair: &CurrencyPair) -> Vec<Order> {
    rows.iter()
        .map(|row| {
            order_from_row(row, pair).unwrap_or_else(|e| {
                let order_id = value_to_id(&row.order_id).unwrap_or_default();
                warn!(%order_id, error = %e, "degrading malformed order row");
                Order {
                    pair: pair.clone(),
                    side: convert_side(&row.order_type),
                    amount: 0.0,
                    price: 0.0,
                    deal_amount: 0.0,
                    avg_price: 0.0,
                    status: OrderStatus::Unfinished,
                    order_id,
                    order_time_ms: 0,
                    raw_status: None,
                }
            })
        })
        .collect()
}
