//! Trading client facade.
//!
//! Ties together validation, caching, retry, balance tracking, and dry-run
//! simulation over abstract gateway/signer/journal collaborators. All
//! network calls flow through the retry policy and honor the caller's
//! cancellation token.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use crate::balance::{BalanceSnapshot, BalanceTracker};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::ClientError;
use crate::gateway::{ChainSigner, Journal, JournalStats, MarketGateway, OrderAck, SignedOrder};
use crate::journal::MemoryJournal;
use crate::market::{Market, MarketFilters};
use crate::order::{OpenOrder, OrderKind, OrderRequest, OrderResult, OrderStatus, Side};
use crate::orderbook::OrderBook;
use crate::rest::RestGateway;
use crate::retry::RetryPolicy;
use crate::signer::LocalWalletSigner;
use crate::sim::DryRunSimulator;
use crate::validate::{validate, ValidationError, Violation};

/// Order book and price entries go stale fast.
const BOOK_TTL: Duration = Duration::from_secs(2);
const PRICE_TTL: Duration = Duration::from_secs(2);

/// Session health as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live call has succeeded yet
    Uninitialized,
    Ready,
    /// The last venue interaction failed with a venue-side error
    Degraded,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SessionState::Ready,
            2 => SessionState::Degraded,
            _ => SessionState::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SessionState::Uninitialized => 0,
            SessionState::Ready => 1,
            SessionState::Degraded => 2,
        }
    }
}

/// Snapshot returned by [`TradingClient::health_check`].
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub gateway_reachable: bool,
    pub signer_address: String,
    pub session: SessionState,
    pub dry_run: bool,
    /// Age of the balance snapshot, when one exists
    pub snapshot_age_secs: Option<i64>,
    pub cached_markets: usize,
    pub cached_books: usize,
    pub cached_prices: usize,
}

/// High-level trading client.
pub struct TradingClient {
    config: Config,
    gateway: Arc<dyn MarketGateway>,
    signer: Arc<dyn ChainSigner>,
    journal: Option<Arc<dyn Journal>>,
    retry: RetryPolicy,
    markets: TtlCache<Vec<Market>>,
    books: TtlCache<OrderBook>,
    prices: TtlCache<Decimal>,
    balances: Arc<BalanceTracker>,
    simulator: DryRunSimulator,
    state: AtomicU8,
}

impl TradingClient {
    pub fn new(
        config: Config,
        gateway: Arc<dyn MarketGateway>,
        signer: Arc<dyn ChainSigner>,
        journal: Option<Arc<dyn Journal>>,
    ) -> Self {
        let balance_cache = Arc::new(TtlCache::new());
        let balances = Arc::new(BalanceTracker::new(balance_cache, config.cache_ttl()));
        let simulator = DryRunSimulator::new(balances.clone());

        tracing::info!(
            dry_run = config.dry_run,
            cache_enabled = config.cache_enabled,
            "Trading client initialized"
        );

        Self {
            config,
            gateway,
            signer,
            journal,
            retry: RetryPolicy::default(),
            markets: TtlCache::new(),
            books: TtlCache::new(),
            prices: TtlCache::new(),
            balances,
            simulator,
            state: AtomicU8::new(SessionState::Uninitialized.as_u8()),
        }
    }

    /// Wire up the production gateway, wallet signer, and in-memory journal.
    pub fn from_config(config: Config) -> Result<Self, ClientError> {
        let gateway = Arc::new(RestGateway::from_config(&config).map_err(ClientError::Venue)?);
        let signer = Arc::new(LocalWalletSigner::new(
            &config.private_key,
            config.chain_id,
            &config.clob_url,
        )?);
        let journal: Arc<dyn Journal> = Arc::new(MemoryJournal::new());
        Ok(Self::new(config, gateway, signer, Some(journal)))
    }

    /// Override the default retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    pub fn session_state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Track session health off live call outcomes. Venue-side failures
    /// degrade the session; any success restores it.
    fn note_outcome<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        match &result {
            Ok(_) => self.set_state(SessionState::Ready),
            Err(ClientError::Venue(_)) => self.set_state(SessionState::Degraded),
            Err(_) => {}
        }
        result
    }

    fn cache_enabled(&self) -> bool {
        self.config.cache_enabled
    }

    // ----- market data -----

    /// List markets, serving from cache when possible.
    pub async fn get_markets(
        &self,
        filters: &MarketFilters,
        use_cache: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Market>, ClientError> {
        let key = filters.cache_key();
        if use_cache && self.cache_enabled() {
            if let Some(markets) = self.markets.get(&key) {
                tracing::debug!(key = key.as_str(), "Market cache hit");
                return Ok(markets);
            }
        }

        let result = self
            .retry
            .execute(cancel, || self.gateway.fetch_markets(filters))
            .await;
        let markets = self.note_outcome(result)?;

        if self.cache_enabled() {
            self.markets
                .put(&key, markets.clone(), self.config.cache_ttl());
        }
        Ok(markets)
    }

    /// Single market lookup by ID. `Ok(None)` when the venue has no such market.
    pub async fn get_market_by_id(
        &self,
        market_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Market>, ClientError> {
        let result = self
            .retry
            .execute(cancel, || self.gateway.fetch_market(market_id))
            .await;
        self.note_outcome(result)
    }

    /// Substring search across question and description.
    ///
    /// Over-fetches relative to `limit` so filtering still returns a full
    /// page when most markets miss the query.
    pub async fn search_markets(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Market>, ClientError> {
        let filters = MarketFilters {
            limit: limit.saturating_mul(3),
            ..MarketFilters::default()
        };
        let markets = self.get_markets(&filters, true, cancel).await?;
        Ok(markets
            .into_iter()
            .filter(|m| m.matches_query(query))
            .take(limit)
            .collect())
    }

    /// Depth snapshot for a token, cached briefly.
    pub async fn get_order_book(
        &self,
        token_id: &str,
        cancel: &CancellationToken,
    ) -> Result<OrderBook, ClientError> {
        let key = format!("book_{}", token_id);
        if self.cache_enabled() {
            if let Some(book) = self.books.get(&key) {
                return Ok(book);
            }
        }

        let result = self
            .retry
            .execute(cancel, || self.gateway.fetch_order_book(token_id))
            .await;
        let book = self.note_outcome(result)?;

        if self.cache_enabled() {
            self.books.put(&key, book.clone(), BOOK_TTL);
        }
        Ok(book)
    }

    /// Side price for a token, cached briefly.
    pub async fn get_price(
        &self,
        token_id: &str,
        side: Side,
        cancel: &CancellationToken,
    ) -> Result<Decimal, ClientError> {
        let key = format!("price_{}_{}", token_id, side.as_str());
        if self.cache_enabled() {
            if let Some(price) = self.prices.get(&key) {
                return Ok(price);
            }
        }

        let result = self
            .retry
            .execute(cancel, || self.gateway.fetch_price(token_id, side))
            .await;
        let price = self.note_outcome(result)?;

        if self.cache_enabled() {
            self.prices.put(&key, price, PRICE_TTL);
        }
        Ok(price)
    }

    /// Mid price from the book, falling back to the venue's buy price for
    /// one-sided books. The result is cached so dry-run market orders can
    /// fill against it.
    pub async fn get_mid_price(
        &self,
        token_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal, ClientError> {
        let book = self.get_order_book(token_id, cancel).await?;
        let mid = match book.mid_price() {
            Some(mid) => mid,
            None => self.get_price(token_id, Side::Buy, cancel).await?,
        };

        if self.cache_enabled() {
            self.prices.put(&mid_key(token_id), mid, PRICE_TTL);
        }
        Ok(mid)
    }

    // ----- order flow -----

    /// Place a limit order. The request must carry a limit price.
    pub async fn create_limit_order(
        &self,
        request: OrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderResult, ClientError> {
        self.submit(request, OrderKind::Limit, cancel).await
    }

    /// Place a market order. The request must not carry a price.
    pub async fn create_market_order(
        &self,
        request: OrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderResult, ClientError> {
        self.submit(request, OrderKind::Market, cancel).await
    }

    async fn submit(
        &self,
        request: OrderRequest,
        expected: OrderKind,
        cancel: &CancellationToken,
    ) -> Result<OrderResult, ClientError> {
        if request.kind != expected {
            return Err(ClientError::Validation(ValidationError::single(
                Violation::KindMismatch {
                    expected,
                    actual: request.kind,
                },
            )));
        }
        validate(&request)?;

        if self.config.dry_run {
            let mid = self.prices.get(&mid_key(&request.token_id));
            return self.simulator.simulate(&request, mid);
        }

        // Signing failures are never retried.
        let signature = self.signer.sign(&request).await?;
        let signed = SignedOrder {
            maker: self.signer.address(),
            signature,
            request: request.clone(),
        };

        let result = self
            .retry
            .execute(cancel, || self.gateway.submit_order(&signed))
            .await;
        let ack = self.note_outcome(result)?;

        // Known only when the ack carries a fill price or the order had a
        // limit price; market-order acks may omit it.
        let known_price = ack.fill_price.or(request.price);
        let result = self.result_from_ack(&request, ack, known_price);
        if result.fill_size > Decimal::ZERO {
            match known_price {
                Some(price) => {
                    self.balances
                        .apply_fill(&request.token_id, request.side, price, result.fill_size);
                }
                None => {
                    tracing::warn!(
                        order_id = result.order_id.as_str(),
                        "Ack omitted the fill price, skipping optimistic balance update"
                    );
                }
            }
        }

        tracing::info!(
            order_id = result.order_id.as_str(),
            token_id = request.token_id.as_str(),
            side = request.side.as_str(),
            status = ?result.status,
            fill_size = %result.fill_size,
            "Order placed"
        );

        if let Some(journal) = &self.journal {
            // Journaling is best effort; the order already executed.
            if let Err(e) = journal.append(&result).await {
                tracing::warn!(error = %e, order_id = result.order_id.as_str(), "Journal append failed");
            }
        }
        Ok(result)
    }

    fn result_from_ack(
        &self,
        request: &OrderRequest,
        ack: OrderAck,
        known_price: Option<Decimal>,
    ) -> OrderResult {
        let status = if ack.status.eq_ignore_ascii_case("rejected") {
            OrderStatus::Rejected
        } else if ack.filled_size >= request.size {
            OrderStatus::Filled
        } else if ack.filled_size > Decimal::ZERO {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Accepted
        };

        OrderResult {
            order_id: ack.order_id,
            status,
            fill_price: known_price.unwrap_or(Decimal::ZERO),
            fill_size: ack.filled_size,
            timestamp: chrono::Utc::now(),
            dry_run: false,
        }
    }

    /// Resting orders for the wallet, optionally scoped to one market.
    /// Always live; open-order state is too volatile to cache.
    pub async fn get_orders(
        &self,
        market_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<OpenOrder>, ClientError> {
        let result = self
            .retry
            .execute(cancel, || self.gateway.fetch_orders(market_id))
            .await;
        self.note_outcome(result)
    }

    /// Cancel a resting order. In dry-run mode this is a logged no-op.
    pub async fn cancel_order(
        &self,
        order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        if self.config.dry_run {
            tracing::info!(order_id, "[DRY RUN] Would cancel order");
            return Ok(());
        }

        let result = self
            .retry
            .execute(cancel, || self.gateway.cancel_order(order_id))
            .await;
        self.note_outcome(result)?;
        tracing::info!(order_id, "Order cancelled");
        Ok(())
    }

    /// Cancel all resting orders, optionally scoped to one market, returning
    /// how many were cancelled.
    pub async fn cancel_all_orders(
        &self,
        market_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<usize, ClientError> {
        if self.config.dry_run {
            tracing::info!(market_id, "[DRY RUN] Would cancel all orders");
            return Ok(0);
        }

        let result = self
            .retry
            .execute(cancel, || self.gateway.cancel_all(market_id))
            .await;
        let count = self.note_outcome(result)?;
        tracing::info!(count, market_id, "All orders cancelled");
        Ok(count)
    }

    // ----- balances -----

    /// Force a fresh balance snapshot from the venue and chain.
    pub async fn refresh_balances(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BalanceSnapshot, ClientError> {
        let result = self
            .balances
            .refresh(
                self.gateway.as_ref(),
                self.signer.as_ref(),
                &self.retry,
                cancel,
            )
            .await;
        self.note_outcome(result)
    }

    /// Last-known balance snapshot and its age, without network access.
    pub fn balance(&self) -> Option<(BalanceSnapshot, chrono::Duration)> {
        self.balances.current()
    }

    // ----- housekeeping -----

    /// Aggregate health report. Never fails; unreachable collaborators show
    /// up as report fields.
    pub async fn health_check(&self, cancel: &CancellationToken) -> HealthReport {
        let gateway_reachable = if cancel.is_cancelled() {
            false
        } else {
            match self.gateway.ping().await {
                Ok(()) => {
                    self.set_state(SessionState::Ready);
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Gateway ping failed");
                    false
                }
            }
        };

        HealthReport {
            gateway_reachable,
            signer_address: self.signer.address(),
            session: self.session_state(),
            dry_run: self.config.dry_run,
            snapshot_age_secs: self.balances.current().map(|(_, age)| age.num_seconds()),
            cached_markets: self.markets.len(),
            cached_books: self.books.len(),
            cached_prices: self.prices.len(),
        }
    }

    /// Drop all cached market data.
    pub fn clear_cache(&self) {
        self.markets.clear();
        self.books.clear();
        self.prices.clear();
        tracing::debug!("Market data caches cleared");
    }

    /// Drop journal entries older than the given number of days.
    pub async fn cleanup_journal(&self, older_than_days: i64) -> Result<JournalStats, ClientError> {
        match &self.journal {
            Some(journal) => Ok(journal.cleanup(older_than_days).await?),
            None => Ok(JournalStats {
                removed: 0,
                retained: 0,
            }),
        }
    }
}

fn mid_key(token_id: &str) -> String {
    format!("mid_{}", token_id)
}
