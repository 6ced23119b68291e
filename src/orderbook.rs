//! Order book snapshots for pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price level in the order book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub size: Decimal,
}

/// Depth snapshot for a single token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub token_id: String,
    /// Bid levels, sorted by price descending (best bid first)
    pub bids: Vec<Level>,
    /// Ask levels, sorted by price ascending (best ask first)
    pub asks: Vec<Level>,
    /// Timestamp of the snapshot (Unix ms)
    pub timestamp: i64,
}

impl OrderBook {
    /// Create a new empty order book.
    pub fn new(token_id: String) -> Self {
        Self {
            token_id,
            bids: Vec::new(),
            asks: Vec::new(),
            timestamp: 0,
        }
    }

    /// Build a snapshot from raw levels, enforcing the sort invariants.
    pub fn with_levels(token_id: String, mut bids: Vec<Level>, mut asks: Vec<Level>) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            token_id,
            bids,
            asks,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Best bid price and size.
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    /// Best ask price and size.
    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    /// Mid price (average of best bid and ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::TWO),
            _ => None,
        }
    }

    /// Spread (best ask - best bid).
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }
}
