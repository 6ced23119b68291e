//! Pure order validation.
//!
//! Runs before any side effect. Every violated rule is collected and
//! reported together so callers can surface all problems at once.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::order::{OrderKind, OrderRequest};

/// A single violated validation rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("price {0} is outside the open interval (0, 1)")]
    PriceOutOfRange(Decimal),

    #[error("limit orders require a price")]
    PriceMissing,

    #[error("market orders must not carry a price")]
    PriceForbidden,

    #[error("size {0} must be strictly positive")]
    SizeNotPositive(Decimal),

    #[error("token id is empty")]
    EmptyTokenId,

    #[error("token id '{0}' is not a decimal token identifier")]
    MalformedTokenId(String),

    #[error("order kind {actual:?} does not match the requested operation ({expected:?})")]
    KindMismatch {
        expected: OrderKind,
        actual: OrderKind,
    },
}

/// Validation failure carrying every violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order failed validation: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate an order request.
///
/// Rules: price (when present) must lie strictly inside (0, 1) since outcome
/// token prices are probabilities; size must be strictly positive; limit
/// orders require a price while market orders must omit it; the token id must
/// be a non-empty decimal string (venue token ids are stringified U256
/// values). Pure function, no side effects.
pub fn validate(request: &OrderRequest) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    match (request.kind, request.price) {
        (OrderKind::Limit, None) => violations.push(Violation::PriceMissing),
        (OrderKind::Market, Some(_)) => violations.push(Violation::PriceForbidden),
        _ => {}
    }

    if let Some(price) = request.price {
        if price <= Decimal::ZERO || price >= Decimal::ONE {
            violations.push(Violation::PriceOutOfRange(price));
        }
    }

    if request.size <= Decimal::ZERO {
        violations.push(Violation::SizeNotPositive(request.size));
    }

    if request.token_id.is_empty() {
        violations.push(Violation::EmptyTokenId);
    } else if !request.token_id.bytes().all(|b| b.is_ascii_digit()) {
        violations.push(Violation::MalformedTokenId(request.token_id.clone()));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}
