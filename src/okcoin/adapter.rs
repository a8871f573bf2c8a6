//! OKCoin International adapter.
//!
//! The venue-specific surface is thin: `okcoin.com` reuses the shared v1
//! REST behavior by composition and overrides only the balance-sheet fiat
//! (dollars rather than the domestic site's yuan) and its identity.

use std::sync::Arc;

use crate::currency::{self, CurrencyPair};
use crate::error::Result;
use crate::okcoin::common::{OkCoinAuth, OkCoinRest, OKCOIN_COM_REST_URL};
use crate::traits::{
    Account, CryptoAddress, Depth, Exchange, Order, OrderKind, Ticker, TradeSide, Withdraw,
};
use crate::transport::HttpTransport;

pub const EXCHANGE_NAME: &str = "okcoin.com";

pub struct OkCoinCom {
    base: OkCoinRest,
}

impl OkCoinCom {
    pub fn new(transport: Arc<dyn HttpTransport>, access_key: String, secret_key: String) -> Self {
        let auth = OkCoinAuth::new(access_key, secret_key);
        Self {
            base: OkCoinRest::new(transport, auth, OKCOIN_COM_REST_URL.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Exchange for OkCoinCom {
    fn exchange_name(&self) -> &'static str {
        EXCHANGE_NAME
    }

    async fn get_ticker(&self, pair: &CurrencyPair) -> Result<Ticker> {
        self.base.ticker(pair).await
    }

    async fn get_depth(&self, size: usize, pair: &CurrencyPair) -> Result<Depth> {
        self.base.depth(size, pair).await
    }

    async fn get_account(&self) -> Result<Account> {
        self.base.account(EXCHANGE_NAME, currency::USD).await
    }

    async fn place_order(
        &self,
        side: TradeSide,
        kind: OrderKind,
        amount: f64,
        price: f64,
        pair: &CurrencyPair,
    ) -> Result<Order> {
        self.base.place_order(side, kind, amount, price, pair).await
    }

    async fn cancel_order(&self, order_id: &str, pair: &CurrencyPair) -> Result<bool> {
        self.base.cancel_order(order_id, pair).await
    }

    async fn get_order_info(&self, order_id: &str, pair: &CurrencyPair) -> Result<Order> {
        self.base.get_order_info(order_id, pair).await
    }

    async fn get_unfinished_orders(&self, pair: &CurrencyPair) -> Result<Vec<Order>> {
        self.base.unfinished_orders(pair).await
    }

    async fn get_order_history(
        &self,
        pair: &CurrencyPair,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Order>> {
        self.base.order_history(pair, page, page_size).await
    }

    async fn withdraw(
        &self,
        pair: &CurrencyPair,
        address: &dyn CryptoAddress,
        amount: f64,
        _wallet: &str,
        admin_password: &str,
    ) -> Result<Withdraw> {
        self.base
            .withdraw(pair, address.address(), amount, admin_password)
            .await
    }
}
