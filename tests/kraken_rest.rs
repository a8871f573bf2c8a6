mod support;

use std::sync::Arc;

use omniex::currency::{self, BTC_USD};
use omniex::error::ExchangeError;
use omniex::kraken::Kraken;
use omniex::traits::{Exchange, OrderKind, OrderStatus, TradeSide};
use support::{Reply, ScriptedTransport};

const TICKER: &str = include_str!("./fixtures/kraken_ticker.json");
const DEPTH: &str = include_str!("./fixtures/kraken_depth.json");
const BALANCE: &str = include_str!("./fixtures/kraken_balance.json");
const ADD_ORDER: &str = include_str!("./fixtures/kraken_add_order.json");
const CANCEL: &str = include_str!("./fixtures/kraken_cancel.json");
const REJECTED: &str = include_str!("./fixtures/kraken_rejected.json");
const QUERY_ORDER: &str = include_str!("./fixtures/kraken_query_order.json");
const QUERY_ORDER_EMPTY: &str = include_str!("./fixtures/kraken_query_order_empty.json");
const OPEN_ORDERS: &str = include_str!("./fixtures/kraken_open_orders.json");
const WITHDRAW: &str = include_str!("./fixtures/kraken_withdraw.json");

fn kraken(transport: Arc<ScriptedTransport>) -> Kraken {
    Kraken::new(transport, "access".to_string(), "YmFzZTY0c2VjcmV0".to_string())
}

#[tokio::test]
async fn ticker_normalizes_field_arrays() {
    let transport = ScriptedTransport::replying(TICKER);
    let adapter = kraken(transport.clone());

    let ticker = adapter.get_ticker(&BTC_USD).await.expect("ticker");
    assert_eq!(ticker.last, 50300.0);
    assert_eq!(ticker.buy, 50299.9);
    assert_eq!(ticker.sell, 50300.1);
    assert_eq!(ticker.low, 49000.0);
    assert_eq!(ticker.high, 51000.0);
    assert_eq!(ticker.vol, 1234.56789);

    // The venue dialect renders Bitcoin as XBT with no separator.
    let request = &transport.requests()[0];
    assert_eq!(request.method, "GET");
    assert!(request.url.contains("/0/public/Ticker"));
    assert!(request.url.contains("pair=XBTUSD"));
}

#[tokio::test]
async fn depth_is_sorted_regardless_of_upstream_order() {
    let transport = ScriptedTransport::replying(DEPTH);
    let adapter = kraken(transport);

    let depth = adapter.get_depth(3, &BTC_USD).await.expect("depth");
    assert_eq!(depth.asks.len(), 3);
    assert_eq!(depth.bids.len(), 3);
    assert!(depth.asks.windows(2).all(|w| w[0].price <= w[1].price));
    assert!(depth.bids.windows(2).all(|w| w[0].price >= w[1].price));
    assert_eq!(depth.asks[0].price, 50310.0);
    assert_eq!(depth.bids[0].price, 50300.0);
}

#[tokio::test]
async fn account_remaps_prefixed_balance_keys() {
    let transport = ScriptedTransport::replying(BALANCE);
    let adapter = kraken(transport.clone());

    let account = adapter.get_account().await.expect("account");
    assert_eq!(account.exchange, "kraken.com");

    // XXBT surfaces as both XBT and canonical BTC, ZUSD as USD, XETH as ETH.
    assert_eq!(account.sub_accounts.len(), 4);
    assert_eq!(account.sub_accounts[&currency::XBT].amount, 1.5);
    assert_eq!(account.sub_accounts[&currency::BTC].amount, 1.5);
    assert_eq!(account.sub_accounts[&currency::USD].amount, 1000.0);
    assert_eq!(
        account.sub_accounts[&omniex::Currency::new("ETH", "")].amount,
        10.25
    );

    // Balance is a private call: signed POST with both auth headers.
    let request = &transport.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("API-Key"), Some("access"));
    assert!(request.header("API-Sign").is_some_and(|s| !s.is_empty()));
    assert!(request.form_field("nonce").is_some());
}

#[tokio::test]
async fn place_order_builds_the_venue_params_and_returns_the_txid() {
    let transport = ScriptedTransport::replying(ADD_ORDER);
    let adapter = kraken(transport.clone());

    let order = adapter
        .place_order(TradeSide::Buy, OrderKind::Limit, 0.01, 50000.0, &BTC_USD)
        .await
        .expect("order");

    assert_eq!(order.order_id, "OUF4EM-FRGI2-MQMWZD");
    assert_eq!(order.status, OrderStatus::Unfinished);
    assert_eq!(order.amount, 0.01);
    assert_eq!(order.price, 50000.0);
    assert_eq!(order.pair, BTC_USD);

    let request = &transport.requests()[0];
    assert!(request.url.ends_with("/0/private/AddOrder"));
    assert_eq!(request.form_field("pair").as_deref(), Some("XBTUSD"));
    assert_eq!(request.form_field("type").as_deref(), Some("buy"));
    assert_eq!(request.form_field("ordertype").as_deref(), Some("limit"));
    assert_eq!(request.form_field("volume").as_deref(), Some("0.01"));
}

#[tokio::test]
async fn envelope_errors_surface_verbatim_with_no_partial_order() {
    let transport = ScriptedTransport::replying(REJECTED);
    let adapter = kraken(transport);

    let result = adapter
        .place_order(TradeSide::Sell, OrderKind::Limit, 1_000_000.0, 690_000.0, &BTC_USD)
        .await;

    match result {
        Err(ExchangeError::Rejected(msg)) => assert_eq!(msg, "EOrder:Insufficient funds"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_reports_whether_anything_was_cancelled() {
    let transport = ScriptedTransport::replying(CANCEL);
    let adapter = kraken(transport);

    let cancelled = adapter
        .cancel_order("OUF4EM-FRGI2-MQMWZD", &BTC_USD)
        .await
        .expect("cancel");
    assert!(cancelled);
}

#[tokio::test]
async fn order_info_maps_the_closed_status() {
    let transport = ScriptedTransport::replying(QUERY_ORDER);
    let adapter = kraken(transport);

    let order = adapter
        .get_order_info("OQCLML-BW3P3-BUCMWZ", &BTC_USD)
        .await
        .expect("order info");

    assert_eq!(order.order_id, "OQCLML-BW3P3-BUCMWZ");
    assert_eq!(order.side, TradeSide::Buy);
    assert_eq!(order.amount, 1.25);
    assert_eq!(order.deal_amount, 1.25);
    assert_eq!(order.price, 30010.0);
    assert_eq!(order.avg_price, 30010.4);
    assert_eq!(order.status, OrderStatus::Canceled);
    assert_eq!(order.raw_status.as_deref(), Some("closed"));
}

#[tokio::test]
async fn missing_order_is_not_found_rather_than_rejected() {
    let transport = ScriptedTransport::replying(QUERY_ORDER_EMPTY);
    let adapter = kraken(transport);

    let result = adapter.get_order_info("ODCRMQ-RDEID-CY334C", &BTC_USD).await;
    match result {
        Err(ExchangeError::NotFound(id)) => assert_eq!(id, "ODCRMQ-RDEID-CY334C"),
        other => panic!("expected not-found, got {other:?}"),
    }
}

#[tokio::test]
async fn one_malformed_open_order_degrades_instead_of_failing_the_batch() {
    let transport = ScriptedTransport::replying(OPEN_ORDERS);
    let adapter = kraken(transport);

    let orders = adapter
        .get_unfinished_orders(&BTC_USD)
        .await
        .expect("open orders");
    assert_eq!(orders.len(), 2);

    let good = orders
        .iter()
        .find(|o| o.order_id == "OAAAAA-BBBBB-CCCCC1")
        .expect("well-formed order");
    assert_eq!(good.amount, 1.0);
    assert_eq!(good.deal_amount, 0.25);
    assert_eq!(good.status, OrderStatus::Unfinished);

    let degraded = orders
        .iter()
        .find(|o| o.order_id == "OAAAAA-BBBBB-CCCCC2")
        .expect("degraded order");
    assert_eq!(degraded.amount, 0.0);
    assert_eq!(degraded.status, OrderStatus::Unfinished);
    assert!(degraded.raw_status.is_none());
}

#[tokio::test]
async fn withdraw_uses_the_named_key_and_returns_the_reference() {
    let transport = ScriptedTransport::replying(WITHDRAW);
    let adapter = kraken(transport.clone());

    let address = omniex::traits::StaticAddress {
        currency: currency::BTC,
        address: "ignored-for-kraken".to_string(),
        tag: "cold-wallet".to_string(),
        exchange_name: "kraken.com".to_string(),
    };

    let withdraw = adapter
        .withdraw(&BTC_USD, &address, 0.1, "", "")
        .await
        .expect("withdraw");
    assert_eq!(withdraw.ref_id, "AGBSO6T-UFMTTQ-I7KGS6");

    let request = &transport.requests()[0];
    assert_eq!(request.form_field("asset").as_deref(), Some("BTC"));
    assert_eq!(request.form_field("key").as_deref(), Some("cold-wallet"));
}

#[tokio::test]
async fn unsupported_operations_are_typed_failures() {
    let transport = ScriptedTransport::new(Vec::new());
    let adapter = kraken(transport);

    let result = adapter.get_order_history(&BTC_USD, 1, 50).await;
    match result {
        Err(ExchangeError::NotSupported {
            exchange,
            operation,
        }) => {
            assert_eq!(exchange, "kraken.com");
            assert_eq!(operation, "get_order_history");
        }
        other => panic!("expected not-supported, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failures_pass_through_untouched() {
    let transport = ScriptedTransport::new(vec![Reply::Status(503, "upstream unavailable")]);
    let adapter = kraken(transport);

    let result = adapter.get_ticker(&BTC_USD).await;
    assert!(matches!(
        result,
        Err(ExchangeError::Transport {
            status: Some(503),
            ..
        })
    ));
}

#[tokio::test]
async fn concurrent_private_calls_use_strictly_distinct_nonces() {
    let replies = (0..8).map(|_| Reply::Body(BALANCE)).collect();
    let transport = ScriptedTransport::new(replies);
    let adapter = Arc::new(kraken(transport.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let adapter = adapter.clone();
        handles.push(tokio::spawn(async move { adapter.get_account().await }));
    }
    for handle in handles {
        handle.await.expect("task").expect("account");
    }

    let mut nonces: Vec<u64> = transport
        .requests()
        .iter()
        .map(|r| {
            r.form_field("nonce")
                .expect("nonce present")
                .parse()
                .expect("nonce numeric")
        })
        .collect();
    assert_eq!(nonces.len(), 8);

    nonces.sort_unstable();
    nonces.dedup();
    assert_eq!(nonces.len(), 8, "nonces must never collide");

    for request in transport.requests() {
        assert!(request.header("API-Sign").is_some_and(|s| !s.is_empty()));
    }
}
