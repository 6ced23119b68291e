//! Dry-run order simulation.
//!
//! Produces synthetic fills without touching the network or the signer,
//! while keeping the balance tracker's optimistic state consistent so a
//! dry-run session shows realistic cumulative exposure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::balance::BalanceTracker;
use crate::error::ClientError;
use crate::order::{OrderKind, OrderRequest, OrderResult, OrderStatus, DRY_RUN_PREFIX};
use crate::validate::{ValidationError, Violation};

/// Simulates fills for dry-run mode.
pub struct DryRunSimulator {
    tracker: Arc<BalanceTracker>,
    seq: AtomicU64,
}

impl DryRunSimulator {
    pub fn new(tracker: Arc<BalanceTracker>) -> Self {
        Self {
            tracker,
            seq: AtomicU64::new(0),
        }
    }

    /// Simulate a fill for an already-validated request.
    ///
    /// Limit orders fill fully at their limit price. Market orders fill at
    /// the supplied mid price; with no mid price available the simulation
    /// fails closed with [`ClientError::NoPriceData`] before any balance
    /// state is touched.
    pub fn simulate(
        &self,
        request: &OrderRequest,
        mid_price: Option<Decimal>,
    ) -> Result<OrderResult, ClientError> {
        let fill_price = match request.kind {
            OrderKind::Limit => request.price.ok_or_else(|| {
                ClientError::Validation(ValidationError::single(Violation::PriceMissing))
            })?,
            OrderKind::Market => mid_price
                .ok_or_else(|| ClientError::NoPriceData(request.token_id.clone()))?,
        };

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let order_id = format!("{}{}_{}", DRY_RUN_PREFIX, Utc::now().timestamp_millis(), seq);

        self.tracker
            .apply_fill(&request.token_id, request.side, fill_price, request.size);

        tracing::info!(
            order_id,
            token_id = request.token_id,
            side = request.side.as_str(),
            price = %fill_price,
            size = %request.size,
            "[DRY RUN] Simulated fill"
        );

        Ok(OrderResult {
            order_id,
            status: OrderStatus::Filled,
            fill_price,
            fill_size: request.size,
            timestamp: Utc::now(),
            dry_run: true,
        })
    }
}
