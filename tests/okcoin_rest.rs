mod support;

use std::sync::Arc;

use omniex::currency::{self, BTC_USD};
use omniex::error::ExchangeError;
use omniex::okcoin::OkCoinCom;
use omniex::traits::{Exchange, OrderKind, OrderStatus, TradeSide};
use support::ScriptedTransport;

const TICKER: &str = include_str!("./fixtures/okcoin_ticker.json");
const DEPTH: &str = include_str!("./fixtures/okcoin_depth.json");
const USERINFO: &str = include_str!("./fixtures/okcoin_userinfo.json");
const TRADE: &str = include_str!("./fixtures/okcoin_trade.json");
const CANCEL: &str = include_str!("./fixtures/okcoin_cancel.json");
const ORDER_INFO: &str = include_str!("./fixtures/okcoin_order_info.json");
const ORDER_INFO_BAD_ROW: &str = include_str!("./fixtures/okcoin_order_info_bad_row.json");
const ERROR: &str = include_str!("./fixtures/okcoin_error.json");

fn okcoin(transport: Arc<ScriptedTransport>) -> OkCoinCom {
    OkCoinCom::new(transport, "access".to_string(), "secret".to_string())
}

#[tokio::test]
async fn ticker_parses_the_string_fields() {
    let transport = ScriptedTransport::replying(TICKER);
    let adapter = okcoin(transport.clone());

    let ticker = adapter.get_ticker(&BTC_USD).await.expect("ticker");
    assert_eq!(ticker.last, 27550.0);
    assert_eq!(ticker.buy, 27540.12);
    assert_eq!(ticker.sell, 27560.34);
    assert_eq!(ticker.low, 27100.0);
    assert_eq!(ticker.high, 28000.0);
    assert_eq!(ticker.vol, 4021.44);
    assert_eq!(ticker.ts_ms, 1_696_656_000_000);

    let request = &transport.requests()[0];
    assert!(request.url.contains("ticker.do"));
    assert!(request.url.contains("symbol=btc_usd"));
}

#[tokio::test]
async fn descending_upstream_book_comes_back_ordered() {
    let transport = ScriptedTransport::replying(DEPTH);
    let adapter = okcoin(transport);

    let depth = adapter.get_depth(3, &BTC_USD).await.expect("depth");
    assert!(depth.asks.windows(2).all(|w| w[0].price <= w[1].price));
    assert!(depth.bids.windows(2).all(|w| w[0].price >= w[1].price));
    assert_eq!(depth.asks[0].price, 27560.1);
    assert_eq!(depth.bids[0].price, 27550.2);
}

#[tokio::test]
async fn account_parses_the_dollar_book() {
    let transport = ScriptedTransport::replying(USERINFO);
    let adapter = okcoin(transport.clone());

    let account = adapter.get_account().await.expect("account");
    assert_eq!(account.exchange, "okcoin.com");
    assert_eq!(account.asset, 12400.0);
    assert_eq!(account.net_asset, 12345.67);

    let btc = &account.sub_accounts[&currency::BTC];
    assert_eq!(btc.amount, 1.25);
    assert_eq!(btc.frozen_amount, 0.05);

    let usd = &account.sub_accounts[&currency::USD];
    assert_eq!(usd.amount, 2000.5);
    assert_eq!(usd.frozen_amount, 100.0);

    // Private calls carry api_key and the MD5 signature in the form body.
    let request = &transport.requests()[0];
    assert_eq!(request.form_field("api_key").as_deref(), Some("access"));
    let sign = request.form_field("sign").expect("sign present");
    assert_eq!(sign.len(), 32);
    assert!(sign.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
}

#[tokio::test]
async fn market_orders_use_the_market_type_suffix() {
    let transport = ScriptedTransport::replying(TRADE);
    let adapter = okcoin(transport.clone());

    let order = adapter
        .place_order(TradeSide::Buy, OrderKind::Market, 0.1, 27500.0, &BTC_USD)
        .await
        .expect("order");
    assert_eq!(order.order_id, "125433029");
    assert_eq!(order.status, OrderStatus::Unfinished);

    let request = &transport.requests()[0];
    assert!(request.url.ends_with("trade.do"));
    assert_eq!(request.form_field("symbol").as_deref(), Some("btc_usd"));
    assert_eq!(request.form_field("type").as_deref(), Some("buy_market"));
}

#[tokio::test]
async fn cancel_succeeds_on_a_result_true_envelope() {
    let transport = ScriptedTransport::replying(CANCEL);
    let adapter = okcoin(transport);

    let cancelled = adapter.cancel_order("125433029", &BTC_USD).await.expect("cancel");
    assert!(cancelled);
}

#[tokio::test]
async fn numeric_status_codes_map_to_the_canonical_lifecycle() {
    let transport = ScriptedTransport::replying(ORDER_INFO);
    let adapter = okcoin(transport);

    let order = adapter
        .get_order_info("10000591", &BTC_USD)
        .await
        .expect("order info");
    assert_eq!(order.order_id, "10000591");
    assert_eq!(order.side, TradeSide::Sell);
    assert_eq!(order.status, OrderStatus::PartiallyFinished);
    assert_eq!(order.amount, 0.1);
    assert_eq!(order.deal_amount, 0.02);
    assert_eq!(order.price, 27500.0);
}

#[tokio::test]
async fn one_bad_row_degrades_inside_a_batch() {
    let transport = ScriptedTransport::replying(ORDER_INFO_BAD_ROW);
    let adapter = okcoin(transport);

    let orders = adapter
        .get_unfinished_orders(&BTC_USD)
        .await
        .expect("open orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].amount, 0.1);

    let degraded = &orders[1];
    assert_eq!(degraded.order_id, "10000592");
    assert_eq!(degraded.amount, 0.0);
    assert_eq!(degraded.status, OrderStatus::Unfinished);
}

#[tokio::test]
async fn error_codes_surface_as_rejections() {
    let transport = ScriptedTransport::replying(ERROR);
    let adapter = okcoin(transport);

    let address = omniex::traits::StaticAddress {
        currency: currency::ETC,
        address: "0xdeadbeef".to_string(),
        tag: String::new(),
        exchange_name: "okcoin.com".to_string(),
    };

    let result = adapter
        .withdraw(&currency::ETC_USD, &address, 0.1, "", "trade-password")
        .await;
    match result {
        Err(ExchangeError::Rejected(code)) => assert_eq!(code, "10035"),
        other => panic!("expected rejection, got {other:?}"),
    }
}
