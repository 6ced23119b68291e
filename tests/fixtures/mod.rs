//! Shared test fixtures for trading client integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pmclient::error::{GatewayError, SignerError};
use pmclient::gateway::{ChainSigner, MarketGateway, OrderAck, RawBalances, SignedOrder};
use pmclient::market::{Market, MarketFilters, OutcomeToken};
use pmclient::orderbook::{Level, OrderBook};
use pmclient::order::{OpenOrder, OrderRequest, Side};
use pmclient::{Config, Journal, MemoryJournal, RetryPolicy, TradingClient};

pub const MAKER_ADDRESS: &str = "0x00000000000000000000000000000000000000a1";

/// In-memory venue double with canned data and a scripted submit failure
/// queue. Call counters let tests assert exactly how many requests reached
/// the venue.
#[derive(Default)]
pub struct MockGateway {
    markets: Mutex<Vec<Market>>,
    orders: Mutex<Vec<OpenOrder>>,
    books: Mutex<HashMap<String, OrderBook>>,
    prices: Mutex<HashMap<String, Decimal>>,
    usdc_balance: Mutex<Decimal>,
    submit_failures: Mutex<VecDeque<GatewayError>>,
    ping_fails: Mutex<bool>,
    pub fetch_markets_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            usdc_balance: Mutex::new(dec!(100)),
            ..Self::default()
        }
    }

    pub fn with_markets(self, markets: Vec<Market>) -> Self {
        *self.markets.lock() = markets;
        self
    }

    pub fn with_orders(self, orders: Vec<OpenOrder>) -> Self {
        *self.orders.lock() = orders;
        self
    }

    pub fn with_book(self, book: OrderBook) -> Self {
        self.books.lock().insert(book.token_id.clone(), book);
        self
    }

    pub fn with_price(self, token_id: &str, price: Decimal) -> Self {
        self.prices.lock().insert(token_id.to_string(), price);
        self
    }

    pub fn with_usdc(self, usdc: Decimal) -> Self {
        *self.usdc_balance.lock() = usdc;
        self
    }

    /// Queue errors returned by successive `submit_order` calls before the
    /// mock starts acknowledging.
    pub fn with_submit_failures(self, failures: Vec<GatewayError>) -> Self {
        *self.submit_failures.lock() = failures.into();
        self
    }

    pub fn with_ping_failure(self) -> Self {
        *self.ping_fails.lock() = true;
        self
    }
}

#[async_trait]
impl MarketGateway for MockGateway {
    async fn fetch_markets(&self, filters: &MarketFilters) -> Result<Vec<Market>, GatewayError> {
        self.fetch_markets_calls.fetch_add(1, Ordering::SeqCst);
        let markets = self.markets.lock().clone();
        Ok(markets.into_iter().take(filters.limit).collect())
    }

    async fn fetch_market(&self, market_id: &str) -> Result<Option<Market>, GatewayError> {
        Ok(self
            .markets
            .lock()
            .iter()
            .find(|m| m.id == market_id)
            .cloned())
    }

    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, GatewayError> {
        self.books
            .lock()
            .get(token_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn fetch_price(&self, token_id: &str, _side: Side) -> Result<Decimal, GatewayError> {
        self.prices
            .lock()
            .get(token_id)
            .copied()
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn fetch_balances(&self, _address: &str) -> Result<RawBalances, GatewayError> {
        Ok(RawBalances {
            usdc_balance: *self.usdc_balance.lock(),
            token_balances: HashMap::new(),
        })
    }

    async fn submit_order(&self, order: &SignedOrder) -> Result<OrderAck, GatewayError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.submit_failures.lock().pop_front() {
            return Err(failure);
        }
        Ok(OrderAck {
            order_id: format!("live-{}", self.submit_calls.load(Ordering::SeqCst)),
            status: "matched".to_string(),
            filled_size: order.request.size,
            fill_price: order.request.price,
        })
    }

    async fn fetch_orders(&self, market_id: Option<&str>) -> Result<Vec<OpenOrder>, GatewayError> {
        let orders = self.orders.lock().clone();
        Ok(match market_id {
            Some(market) => orders.into_iter().filter(|o| o.market_id == market).collect(),
            None => orders,
        })
    }

    async fn cancel_order(&self, _order_id: &str) -> Result<(), GatewayError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel_all(&self, market_id: Option<&str>) -> Result<usize, GatewayError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        // Scoped cancels report fewer orders than a full sweep.
        Ok(if market_id.is_some() { 1 } else { 2 })
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        if *self.ping_fails.lock() {
            return Err(GatewayError::Connection("refused".to_string()));
        }
        Ok(())
    }
}

/// Signer double that signs everything with a fixed signature.
pub struct MockSigner {
    pub fail_signing: bool,
}

impl MockSigner {
    pub fn new() -> Self {
        Self { fail_signing: false }
    }

    pub fn failing() -> Self {
        Self { fail_signing: true }
    }
}

#[async_trait]
impl ChainSigner for MockSigner {
    fn address(&self) -> String {
        MAKER_ADDRESS.to_string()
    }

    async fn sign(&self, _request: &OrderRequest) -> Result<String, SignerError> {
        if self.fail_signing {
            return Err(SignerError::Signing("test signer failure".to_string()));
        }
        Ok("deadbeef".repeat(16))
    }

    async fn check_allowance(&self, _token: &str) -> Result<Decimal, SignerError> {
        Ok(dec!(1000000))
    }

    async fn set_allowance(&self, _token: &str, _amount: Decimal) -> Result<(), SignerError> {
        Ok(())
    }
}

pub fn test_config(dry_run: bool) -> Config {
    Config {
        private_key: format!("0x{}", "11".repeat(32)),
        clob_url: "http://localhost:1".to_string(),
        gamma_url: "http://localhost:1".to_string(),
        chain_id: 137,
        dry_run,
        cache_enabled: true,
        cache_ttl_secs: 300,
        log_level: "info".to_string(),
    }
}

/// Retry policy with millisecond delays so retry tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        base_delay: std::time::Duration::from_millis(1),
        multiplier: 2.0,
        max_delay: std::time::Duration::from_millis(10),
    }
}

pub fn build_client(
    dry_run: bool,
    gateway: Arc<MockGateway>,
) -> (TradingClient, Arc<MemoryJournal>) {
    build_client_with_signer(dry_run, gateway, MockSigner::new())
}

pub fn build_client_with_signer(
    dry_run: bool,
    gateway: Arc<MockGateway>,
    signer: MockSigner,
) -> (TradingClient, Arc<MemoryJournal>) {
    let journal = Arc::new(MemoryJournal::new());
    let client = TradingClient::new(
        test_config(dry_run),
        gateway,
        Arc::new(signer),
        Some(journal.clone() as Arc<dyn Journal>),
    )
    .with_retry_policy(fast_retry());
    (client, journal)
}

pub fn create_open_order(order_id: &str, market_id: &str, token_id: &str) -> OpenOrder {
    OpenOrder {
        order_id: order_id.to_string(),
        market_id: market_id.to_string(),
        token_id: token_id.to_string(),
        side: Side::Buy,
        price: dec!(0.5),
        size: dec!(10),
        filled_size: dec!(0),
        created_at: None,
    }
}

pub fn create_market(id: &str, question: &str, token_id: &str) -> Market {
    Market {
        id: id.to_string(),
        question: question.to_string(),
        description: None,
        end_date: None,
        active: true,
        volume: Some(dec!(1000)),
        liquidity: Some(dec!(500)),
        outcomes: vec![
            OutcomeToken {
                token_id: token_id.to_string(),
                outcome: "Yes".to_string(),
                price: Some(dec!(0.5)),
                volume: None,
            },
            OutcomeToken {
                token_id: format!("{}9", token_id),
                outcome: "No".to_string(),
                price: Some(dec!(0.5)),
                volume: None,
            },
        ],
        condition_id: None,
        neg_risk: false,
        category: "other".to_string(),
    }
}

/// Create an order book with a single bid and ask level.
pub fn create_order_book(token_id: &str, best_bid: Decimal, best_ask: Decimal) -> OrderBook {
    OrderBook::with_levels(
        token_id.to_string(),
        vec![Level {
            price: best_bid,
            size: dec!(100),
        }],
        vec![Level {
            price: best_ask,
            size: dec!(100),
        }],
    )
}
