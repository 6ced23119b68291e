//! REST implementation of [`MarketGateway`].
//!
//! Market discovery goes through the Gamma API; the order book, pricing,
//! balance, and order endpoints go through the CLOB API. Gamma encodes
//! per-market arrays (outcomes, prices, token IDs) as JSON strings inside
//! the JSON response, so parsing unwraps a second layer.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::Config;
use crate::error::GatewayError;
use crate::gateway::{MarketGateway, OrderAck, RawBalances, SignedOrder};
use crate::market::{detect_category, Market, MarketFilters, OutcomeToken};
use crate::orderbook::{Level, OrderBook};
use crate::order::{OpenOrder, Side};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST-backed venue access.
pub struct RestGateway {
    http: Client,
    gamma_url: String,
    clob_url: String,
}

/// Raw market response from the Gamma API.
#[derive(Debug, Deserialize)]
struct RawMarket {
    id: Option<String>,
    question: Option<String>,
    description: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
    active: Option<bool>,
    volume: Option<String>,
    liquidity: Option<String>,
    outcomes: Option<String>, // JSON-encoded array
    #[serde(rename = "outcomePrices")]
    outcome_prices: Option<String>, // JSON-encoded array
    #[serde(rename = "clobTokenIds")]
    clob_token_ids: Option<String>, // JSON-encoded array
    #[serde(rename = "conditionId")]
    condition_id: Option<String>,
    #[serde(rename = "negRisk")]
    neg_risk: Option<bool>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBookLevel {
    price: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    bids: Vec<RawBookLevel>,
    #[serde(default)]
    asks: Vec<RawBookLevel>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct CancelAllResponse {
    #[serde(default)]
    canceled: Vec<String>,
}

/// Raw resting-order record from the CLOB API.
#[derive(Debug, Deserialize)]
struct RawOrder {
    id: String,
    #[serde(default)]
    market: String,
    asset_id: String,
    side: String,
    price: String,
    original_size: String,
    #[serde(default)]
    size_matched: Option<String>,
    created_at: Option<String>,
}

impl RestGateway {
    pub fn new(gamma_url: &str, clob_url: &str) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        Ok(Self {
            http,
            gamma_url: gamma_url.trim_end_matches('/').to_string(),
            clob_url: clob_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        Self::new(&config.gamma_url, &config.clob_url)
    }

    fn map_send_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else {
            GatewayError::Connection(e.to_string())
        }
    }

    /// Map non-success statuses, pulling the Retry-After header for 429s.
    fn check_status(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(GatewayError::RateLimited { retry_after });
        }
        Err(GatewayError::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }

    fn parse_market(raw: RawMarket) -> Option<Market> {
        let id = raw.id?;
        let question = raw.question.unwrap_or_default();

        let outcome_names: Vec<String> = raw
            .outcomes
            .as_ref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        let outcome_prices: Vec<Option<Decimal>> = raw
            .outcome_prices
            .as_ref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .map(|prices| {
                prices
                    .iter()
                    .map(|p| Decimal::from_str(p).ok())
                    .collect()
            })
            .unwrap_or_default();
        let token_ids: Vec<String> = raw
            .clob_token_ids
            .as_ref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();

        if token_ids.is_empty() {
            tracing::warn!(market_id = id.as_str(), "Skipping market without token IDs");
            return None;
        }

        let outcomes = token_ids
            .into_iter()
            .enumerate()
            .map(|(i, token_id)| OutcomeToken {
                token_id,
                outcome: outcome_names.get(i).cloned().unwrap_or_default(),
                price: outcome_prices.get(i).copied().flatten(),
                volume: None,
            })
            .collect();

        let category = raw
            .category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| detect_category(&question).to_string());

        Some(Market {
            id,
            question,
            description: raw.description,
            end_date: raw.end_date.as_deref().and_then(parse_datetime),
            active: raw.active.unwrap_or(false),
            volume: raw.volume.as_deref().and_then(|s| Decimal::from_str(s).ok()),
            liquidity: raw
                .liquidity
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
            outcomes,
            condition_id: raw.condition_id,
            neg_risk: raw.neg_risk.unwrap_or(false),
            category,
        })
    }

    fn parse_order(raw: RawOrder) -> Option<OpenOrder> {
        let side = match raw.side.as_str() {
            "BUY" => Side::Buy,
            "SELL" => Side::Sell,
            other => {
                tracing::warn!(order_id = raw.id.as_str(), side = other, "Skipping order with unknown side");
                return None;
            }
        };
        let price = match Decimal::from_str(&raw.price) {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(order_id = raw.id.as_str(), "Skipping order with unparseable price");
                return None;
            }
        };
        let size = Decimal::from_str(&raw.original_size).unwrap_or(Decimal::ZERO);
        let filled_size = raw
            .size_matched
            .as_deref()
            .and_then(|s| Decimal::from_str(s).ok())
            .unwrap_or(Decimal::ZERO);

        Some(OpenOrder {
            order_id: raw.id,
            market_id: raw.market,
            token_id: raw.asset_id,
            side,
            price,
            size,
            filled_size,
            created_at: raw.created_at.as_deref().and_then(parse_timestamp),
        })
    }
}

#[async_trait]
impl MarketGateway for RestGateway {
    async fn fetch_markets(&self, filters: &MarketFilters) -> Result<Vec<Market>, GatewayError> {
        let mut url = format!(
            "{}/markets?active={}&limit={}&order=volume&ascending=false",
            self.gamma_url, filters.active_only, filters.limit
        );
        if let Some(category) = &filters.category {
            url.push_str(&format!("&category={}", category));
        }

        let raw: Vec<RawMarket> = self.get_json(&url).await?;
        let markets: Vec<Market> = raw.into_iter().filter_map(Self::parse_market).collect();

        tracing::debug!(count = markets.len(), "Fetched markets from Gamma");
        Ok(markets)
    }

    async fn fetch_market(&self, market_id: &str) -> Result<Option<Market>, GatewayError> {
        let url = format!("{}/markets/{}", self.gamma_url, market_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response)?;
        let raw: RawMarket = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(Self::parse_market(raw))
    }

    async fn fetch_order_book(&self, token_id: &str) -> Result<OrderBook, GatewayError> {
        let url = format!("{}/book?token_id={}", self.clob_url, token_id);
        let raw: RawBook = self.get_json(&url).await?;

        let parse_levels = |levels: Vec<RawBookLevel>| -> Result<Vec<Level>, GatewayError> {
            levels
                .into_iter()
                .map(|l| {
                    Ok(Level {
                        price: Decimal::from_str(&l.price)
                            .map_err(|e| GatewayError::Malformed(e.to_string()))?,
                        size: Decimal::from_str(&l.size)
                            .map_err(|e| GatewayError::Malformed(e.to_string()))?,
                    })
                })
                .collect()
        };

        let mut book = OrderBook::with_levels(
            token_id.to_string(),
            parse_levels(raw.bids)?,
            parse_levels(raw.asks)?,
        );
        if let Some(ts) = raw.timestamp {
            book.timestamp = ts;
        }
        Ok(book)
    }

    async fn fetch_price(&self, token_id: &str, side: Side) -> Result<Decimal, GatewayError> {
        let url = format!(
            "{}/price?token_id={}&side={}",
            self.clob_url,
            token_id,
            side.as_str()
        );
        let raw: RawPrice = self.get_json(&url).await?;
        Decimal::from_str(&raw.price).map_err(|e| GatewayError::Malformed(e.to_string()))
    }

    async fn fetch_balances(&self, address: &str) -> Result<RawBalances, GatewayError> {
        let url = format!("{}/balances?address={}", self.clob_url, address);
        self.get_json(&url).await
    }

    async fn submit_order(&self, order: &SignedOrder) -> Result<OrderAck, GatewayError> {
        let url = format!("{}/order", self.clob_url);
        let response = self
            .http
            .post(&url)
            .json(order)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }

    async fn fetch_orders(&self, market_id: Option<&str>) -> Result<Vec<OpenOrder>, GatewayError> {
        let mut url = format!("{}/orders", self.clob_url);
        if let Some(market) = market_id {
            url.push_str(&format!("?market={}", market));
        }
        let raw: Vec<RawOrder> = self.get_json(&url).await?;
        Ok(raw.into_iter().filter_map(Self::parse_order).collect())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/order/{}", self.clob_url, order_id);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn cancel_all(&self, market_id: Option<&str>) -> Result<usize, GatewayError> {
        let mut url = format!("{}/orders", self.clob_url);
        if let Some(market) = market_id {
            url.push_str(&format!("?market={}", market));
        }
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response)?;
        let body: CancelAllResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(body.canceled.len())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let url = format!("{}/ok", self.clob_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response)?;
        Ok(())
    }
}

/// Parse a CLOB timestamp, which arrives as unix seconds or RFC 3339.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    parse_datetime(s)
}

/// Parse a datetime string in the formats the Gamma API emits.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let s_fixed = if s.ends_with('Z') {
        format!("{}+00:00", &s[..s.len() - 1])
    } else {
        s.to_string()
    };
    DateTime::parse_from_rfc3339(&s_fixed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
