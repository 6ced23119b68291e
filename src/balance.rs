//! Balance and allowance tracking.
//!
//! Holds the last-known [`BalanceSnapshot`], replaced wholesale on each
//! refresh so readers never observe a torn snapshot. Real and simulated
//! fills adjust the snapshot optimistically under a serializing lock, ahead
//! of the next authoritative refresh which overwrites the optimistic state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cache::TtlCache;
use crate::error::ClientError;
use crate::gateway::{ChainSigner, MarketGateway};
use crate::order::Side;
use crate::retry::RetryPolicy;

/// Cache key under which the latest snapshot is mirrored.
pub const BALANCE_CACHE_KEY: &str = "balance";

/// Token name used for the venue's collateral allowance.
pub const COLLATERAL_TOKEN: &str = "USDC";

/// Point-in-time view of balances and allowances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub usdc_balance: Decimal,
    pub token_balances: HashMap<String, Decimal>,
    pub usdc_allowance: Decimal,
    pub token_allowances: HashMap<String, Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    pub fn token_balance(&self, token_id: &str) -> Decimal {
        self.token_balances
            .get(token_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Tracks the last-known snapshot and applies optimistic fill deltas.
pub struct BalanceTracker {
    snapshot: Mutex<Option<BalanceSnapshot>>,
    cache: Arc<TtlCache<BalanceSnapshot>>,
    cache_ttl: StdDuration,
}

impl BalanceTracker {
    pub fn new(cache: Arc<TtlCache<BalanceSnapshot>>, cache_ttl: StdDuration) -> Self {
        Self {
            snapshot: Mutex::new(None),
            cache,
            cache_ttl,
        }
    }

    /// Last-known snapshot and its age, without network access.
    pub fn current(&self) -> Option<(BalanceSnapshot, Duration)> {
        let guard = self.snapshot.lock();
        guard
            .as_ref()
            .map(|snap| (snap.clone(), Utc::now().signed_duration_since(snap.fetched_at)))
    }

    /// Replace the snapshot wholesale and mirror it into the cache.
    pub fn install(&self, snapshot: BalanceSnapshot) {
        self.cache
            .put(BALANCE_CACHE_KEY, snapshot.clone(), self.cache_ttl);
        *self.snapshot.lock() = Some(snapshot);
    }

    /// Optimistically adjust the snapshot for a known fill.
    ///
    /// BUY: collateral decreases by `price * size`, token balance increases
    /// by `size`; SELL is the reverse. Serialized through the snapshot lock
    /// so concurrent fills never lose an update. A later `refresh` reconciles
    /// (overwrites) the optimistic state. No-op when no snapshot exists yet.
    pub fn apply_fill(&self, token_id: &str, side: Side, price: Decimal, size: Decimal) {
        let mut guard = self.snapshot.lock();
        let Some(snap) = guard.as_mut() else {
            tracing::debug!(token_id, "No balance snapshot yet, skipping optimistic update");
            return;
        };

        let cost = price * size;
        let token_balance = snap
            .token_balances
            .entry(token_id.to_string())
            .or_insert(Decimal::ZERO);
        match side {
            Side::Buy => {
                snap.usdc_balance -= cost;
                *token_balance += size;
            }
            Side::Sell => {
                snap.usdc_balance += cost;
                *token_balance -= size;
            }
        }

        tracing::debug!(
            token_id,
            side = side.as_str(),
            cost = %cost,
            usdc = %snap.usdc_balance,
            "Applied optimistic balance update"
        );
        self.cache
            .put(BALANCE_CACHE_KEY, snap.clone(), self.cache_ttl);
    }

    /// Force a live fetch through the retry policy and gateway, replacing the
    /// snapshot atomically.
    ///
    /// Collateral and token balances come from the gateway; allowances come
    /// from the signer and are never retried.
    pub async fn refresh(
        &self,
        gateway: &dyn MarketGateway,
        signer: &dyn ChainSigner,
        retry: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<BalanceSnapshot, ClientError> {
        let address = signer.address();
        let raw = retry
            .execute(cancel, || gateway.fetch_balances(&address))
            .await?;

        let usdc_allowance = signer.check_allowance(COLLATERAL_TOKEN).await?;
        let mut token_allowances = HashMap::new();
        for token_id in raw.token_balances.keys() {
            let allowance = signer.check_allowance(token_id).await?;
            token_allowances.insert(token_id.clone(), allowance);
        }

        let snapshot = BalanceSnapshot {
            usdc_balance: raw.usdc_balance,
            token_balances: raw.token_balances,
            usdc_allowance,
            token_allowances,
            fetched_at: Utc::now(),
        };
        self.install(snapshot.clone());

        tracing::info!(
            usdc = %snapshot.usdc_balance,
            tokens = snapshot.token_balances.len(),
            "Balance snapshot refreshed"
        );
        Ok(snapshot)
    }
}
