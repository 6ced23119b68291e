//! pmclient - Order lifecycle and market data client for Polymarket.
//!
//! This crate provides a trading client that:
//! - Validates orders before any side effect
//! - Caches market data with per-entry TTLs
//! - Retries transient gateway failures with exponential backoff
//! - Tracks balances optimistically between refreshes
//! - Simulates fills in dry-run mode without touching the network
//!
//! # Architecture
//!
//! [`TradingClient`] is a facade over three abstract collaborators: a
//! [`MarketGateway`](gateway::MarketGateway) for venue access, a
//! [`ChainSigner`](gateway::ChainSigner) for wallet operations, and an
//! optional [`Journal`](gateway::Journal) for durable order records. Tests
//! swap in in-memory doubles; production wires up the REST gateway and a
//! local wallet signer.

pub mod balance;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod journal;
pub mod market;
pub mod order;
pub mod orderbook;
pub mod rest;
pub mod retry;
pub mod signer;
pub mod sim;
pub mod validate;

pub use balance::{BalanceSnapshot, BalanceTracker};
pub use cache::TtlCache;
pub use client::{HealthReport, SessionState, TradingClient};
pub use config::{Config, ConfigError};
pub use error::{ClientError, ErrorKind, GatewayError, SignerError};
pub use gateway::{ChainSigner, Journal, MarketGateway, OrderAck, RawBalances, SignedOrder};
pub use journal::MemoryJournal;
pub use market::{Market, MarketFilters, OutcomeToken};
pub use order::{OpenOrder, OrderKind, OrderRequest, OrderResult, OrderStatus, Side, DRY_RUN_PREFIX};
pub use orderbook::{Level, OrderBook};
pub use rest::RestGateway;
pub use retry::RetryPolicy;
pub use signer::LocalWalletSigner;
pub use sim::DryRunSimulator;
pub use validate::{validate, ValidationError, Violation};

/// Re-export commonly used types from dependencies
pub mod prelude {
    pub use crate::{
        ClientError, Config, Market, MarketFilters, OrderKind, OrderRequest, OrderResult,
        OrderStatus, Side, TradingClient,
    };
    pub use rust_decimal::Decimal;
    pub use rust_decimal_macros::dec;
    pub use tokio_util::sync::CancellationToken;
}
