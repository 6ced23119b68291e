//! Order request and result types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reserved prefix for synthetic order ids produced in dry-run mode.
///
/// Real venue identifiers never carry this prefix, so downstream consumers
/// can branch on provenance.
pub const DRY_RUN_PREFIX: &str = "dry_run_";

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Rests at a caller-supplied price.
    Limit,
    /// Crosses at the prevailing price; must not carry a price.
    Market,
}

/// Terminal state of a submission as reported by the venue (or simulator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the venue, resting unfilled.
    Accepted,
    PartiallyFilled,
    Filled,
    Rejected,
}

/// A validated, immutable order submission.
///
/// Constructed by the caller, checked by the validation engine before any
/// side effect, and never mutated afterwards. `client_id` is a
/// client-generated idempotency token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub token_id: String,
    pub side: Side,
    pub kind: OrderKind,
    pub size: Decimal,
    /// Required for limit orders, forbidden for market orders.
    pub price: Option<Decimal>,
    pub client_id: String,
}

impl OrderRequest {
    /// Build a limit order request.
    pub fn limit(token_id: impl Into<String>, side: Side, size: Decimal, price: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side,
            kind: OrderKind::Limit,
            size,
            price: Some(price),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Build a market order request.
    pub fn market(token_id: impl Into<String>, side: Side, size: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side,
            kind: OrderKind::Market,
            size,
            price: None,
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Outcome of one submitted [`OrderRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    /// Venue order id, or a synthetic `dry_run_` id from the simulator.
    pub order_id: String,
    pub status: OrderStatus,
    pub fill_price: Decimal,
    pub fill_size: Decimal,
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
}

impl OrderResult {
    /// Whether this result came from the dry-run simulator.
    pub fn is_simulated(&self) -> bool {
        self.dry_run || self.order_id.starts_with(DRY_RUN_PREFIX)
    }
}

/// A resting order as the venue reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub market_id: String,
    pub token_id: String,
    pub side: Side,
    pub price: Decimal,
    /// Original order size
    pub size: Decimal,
    pub filled_size: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

impl OpenOrder {
    pub fn remaining_size(&self) -> Decimal {
        self.size - self.filled_size
    }
}
