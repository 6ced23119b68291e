//! Market metadata types and query helpers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single tradeable outcome within a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeToken {
    /// CLOB token ID used for order placement and book lookups
    pub token_id: String,
    /// Outcome name (e.g., "Yes", "No")
    pub outcome: String,
    /// Last-known price for this outcome
    pub price: Option<Decimal>,
    /// Traded volume for this outcome
    pub volume: Option<Decimal>,
}

/// Market metadata from the discovery API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    /// Market question text
    pub question: String,
    pub description: Option<String>,
    /// When the market resolves
    pub end_date: Option<DateTime<Utc>>,
    /// Whether the market is open for trading
    pub active: bool,
    pub volume: Option<Decimal>,
    pub liquidity: Option<Decimal>,
    /// One entry per outcome, in API order
    pub outcomes: Vec<OutcomeToken>,
    pub condition_id: Option<String>,
    pub neg_risk: bool,
    /// Category, detected from the question when the API omits one
    pub category: String,
}

impl Market {
    /// Case-insensitive substring match against question and description.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if self.question.to_lowercase().contains(&needle) {
            return true;
        }
        self.description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    /// Token ID for a named outcome, if present.
    pub fn token_for_outcome(&self, outcome: &str) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|t| t.outcome.eq_ignore_ascii_case(outcome))
            .map(|t| t.token_id.as_str())
    }
}

/// Filters for market discovery queries.
#[derive(Debug, Clone)]
pub struct MarketFilters {
    pub active_only: bool,
    pub limit: usize,
    pub category: Option<String>,
}

impl Default for MarketFilters {
    fn default() -> Self {
        Self {
            active_only: true,
            limit: 100,
            category: None,
        }
    }
}

impl MarketFilters {
    /// Cache key covering every field, so distinct filters never collide.
    pub fn cache_key(&self) -> String {
        format!(
            "markets_{}_{}_{}",
            self.active_only,
            self.limit,
            self.category.as_deref().unwrap_or("all")
        )
    }
}

/// Keyword-based category detection for markets the API leaves uncategorized.
pub fn detect_category(question: &str) -> &'static str {
    let q = question.to_lowercase();

    const POLITICS: &[&str] = &[
        "election", "president", "senate", "congress", "governor", "vote", "trump", "biden",
    ];
    const SPORTS: &[&str] = &[
        "nba", "nfl", "mlb", "nhl", "soccer", "football", "championship", "super bowl", "finals",
    ];
    const CRYPTO: &[&str] = &[
        "bitcoin", "btc", "ethereum", "eth", "crypto", "solana", "token",
    ];
    const ENTERTAINMENT: &[&str] = &[
        "oscar", "grammy", "movie", "album", "box office", "emmy",
    ];
    const TECH: &[&str] = &["openai", "google", "apple", "spacex", "tesla", "ai model"];

    let tables: [(&'static str, &[&str]); 5] = [
        ("politics", POLITICS),
        ("sports", SPORTS),
        ("crypto", CRYPTO),
        ("entertainment", ENTERTAINMENT),
        ("tech", TECH),
    ];

    for (category, keywords) in tables {
        if keywords.iter().any(|k| q.contains(k)) {
            return category;
        }
    }
    "other"
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market(question: &str, description: Option<&str>) -> Market {
        Market {
            id: "m1".to_string(),
            question: question.to_string(),
            description: description.map(str::to_string),
            end_date: None,
            active: true,
            volume: Some(dec!(1000)),
            liquidity: None,
            outcomes: vec![
                OutcomeToken {
                    token_id: "123".to_string(),
                    outcome: "Yes".to_string(),
                    price: Some(dec!(0.6)),
                    volume: None,
                },
                OutcomeToken {
                    token_id: "456".to_string(),
                    outcome: "No".to_string(),
                    price: Some(dec!(0.4)),
                    volume: None,
                },
            ],
            condition_id: None,
            neg_risk: false,
            category: "other".to_string(),
        }
    }

    #[test]
    fn test_matches_query_on_question() {
        let m = market("Will BTC hit 100k?", None);
        assert!(m.matches_query("btc"));
        assert!(m.matches_query("100K"));
        assert!(!m.matches_query("eth"));
    }

    #[test]
    fn test_matches_query_on_description() {
        let m = market("Rate decision", Some("Fed cuts rates in September"));
        assert!(m.matches_query("september"));
    }

    #[test]
    fn test_token_for_outcome() {
        let m = market("Test?", None);
        assert_eq!(m.token_for_outcome("yes"), Some("123"));
        assert_eq!(m.token_for_outcome("No"), Some("456"));
        assert_eq!(m.token_for_outcome("Maybe"), None);
    }

    #[test]
    fn test_cache_key_covers_all_fields() {
        let a = MarketFilters::default();
        let b = MarketFilters {
            limit: 50,
            ..MarketFilters::default()
        };
        let c = MarketFilters {
            category: Some("crypto".to_string()),
            ..MarketFilters::default()
        };
        assert_ne!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
        assert_eq!(a.cache_key(), "markets_true_100_all");
    }

    #[test]
    fn test_detect_category() {
        assert_eq!(detect_category("Will Trump win the election?"), "politics");
        assert_eq!(detect_category("NBA finals winner 2026"), "sports");
        assert_eq!(detect_category("Bitcoin above 100k by March?"), "crypto");
        assert_eq!(detect_category("Best Picture Oscar winner"), "entertainment");
        assert_eq!(detect_category("Will OpenAI release GPT-6?"), "tech");
        assert_eq!(detect_category("Will it rain tomorrow?"), "other");
    }
}
