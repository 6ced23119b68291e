//! Abstract collaborators behind the trading client.
//!
//! The client talks to the venue, the chain signer, and the order journal
//! only through these traits, so tests swap in in-memory doubles and the
//! production wiring plugs in REST and wallet implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, JournalError, SignerError};
use crate::market::{Market, MarketFilters};
use crate::order::{OpenOrder, OrderRequest, OrderResult, Side};
use crate::orderbook::OrderBook;

/// An order request plus the signature material the venue requires.
#[derive(Debug, Clone, Serialize)]
pub struct SignedOrder {
    pub request: OrderRequest,
    /// Wallet address of the order maker
    pub maker: String,
    /// Hex-encoded signature over the order payload
    pub signature: String,
}

/// Venue acknowledgement for a submitted order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    /// Venue status string (e.g., "live", "matched", "rejected")
    pub status: String,
    #[serde(default)]
    pub filled_size: Decimal,
    pub fill_price: Option<Decimal>,
}

/// Balances as the venue reports them, before allowance enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBalances {
    pub usdc_balance: Decimal,
    #[serde(default)]
    pub token_balances: HashMap<String, Decimal>,
}

/// Outcome of a journal cleanup pass.
#[derive(Debug, Clone, Copy)]
pub struct JournalStats {
    pub removed: usize,
    pub retained: usize,
}

/// Venue access: market discovery, pricing, and order flow.
#[async_trait]
pub trait MarketGateway: Send + Sync {
    async fn fetch_markets(&self, filters: &MarketFilters) -> Result<Vec<Market>, GatewayError>;

    /// Single market lookup. `Ok(None)` when the venue has no such market.
    async fn fetch_market(&self, market_id: &str) -> Result<Option<Market>, GatewayError>;

    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, GatewayError>;

    /// Current price for one side of a token.
    async fn fetch_price(&self, token_id: &str, side: Side) -> Result<Decimal, GatewayError>;

    async fn fetch_balances(&self, address: &str) -> Result<RawBalances, GatewayError>;

    async fn submit_order(&self, order: &SignedOrder) -> Result<OrderAck, GatewayError>;

    /// Resting orders for the wallet, optionally scoped to one market.
    async fn fetch_orders(&self, market_id: Option<&str>) -> Result<Vec<OpenOrder>, GatewayError>;

    async fn cancel_order(&self, order_id: &str) -> Result<(), GatewayError>;

    /// Cancel resting orders, optionally scoped to one market, returning how
    /// many the venue cancelled.
    async fn cancel_all(&self, market_id: Option<&str>) -> Result<usize, GatewayError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), GatewayError>;
}

/// Wallet operations: signing and on-chain allowances.
#[async_trait]
pub trait ChainSigner: Send + Sync {
    /// Wallet address, without network access.
    fn address(&self) -> String;

    /// Sign the canonical payload for an order, returning a hex signature.
    async fn sign(&self, request: &OrderRequest) -> Result<String, SignerError>;

    async fn check_allowance(&self, token: &str) -> Result<Decimal, SignerError>;

    async fn set_allowance(&self, token: &str, amount: Decimal) -> Result<(), SignerError>;
}

/// Durable record of executed orders.
#[async_trait]
pub trait Journal: Send + Sync {
    async fn append(&self, result: &OrderResult) -> Result<(), JournalError>;

    /// Drop entries older than the given number of days.
    async fn cleanup(&self, older_than_days: i64) -> Result<JournalStats, JournalError>;
}
