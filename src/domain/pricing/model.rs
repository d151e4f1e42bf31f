//! Occupancy-sensitive parking price calculation
//!
//! `amount = base_price × (minutes / 60) × multiplier`, where the multiplier
//! is chosen from the sector's occupancy ratio at the moment of pricing.
//! Amounts are rounded half-up to cents.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{DomainError, DomainResult};

/// One occupancy band. A ratio strictly below `below` selects this tier;
/// the last tier has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTier {
    pub below: Option<Decimal>,
    pub multiplier: Decimal,
}

/// Tiers in evaluation order
pub const PRICE_TIERS: [PriceTier; 4] = [
    PriceTier {
        below: Some(Decimal::from_parts(25, 0, 0, false, 2)),
        multiplier: Decimal::from_parts(90, 0, 0, false, 2),
    },
    PriceTier {
        below: Some(Decimal::from_parts(50, 0, 0, false, 2)),
        multiplier: Decimal::ONE,
    },
    PriceTier {
        below: Some(Decimal::from_parts(75, 0, 0, false, 2)),
        multiplier: Decimal::from_parts(110, 0, 0, false, 2),
    },
    PriceTier {
        below: None,
        multiplier: Decimal::from_parts(125, 0, 0, false, 2),
    },
];

const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Multiplier for an occupancy ratio (`current_occupied / max_capacity`)
pub fn occupancy_multiplier(occupancy_ratio: Decimal) -> Decimal {
    PRICE_TIERS
        .iter()
        .find(|tier| match tier.below {
            Some(bound) => occupancy_ratio < bound,
            None => true,
        })
        .map(|tier| tier.multiplier)
        .unwrap_or(Decimal::ONE)
}

/// Charge for a stay of `parked_minutes` at `base_price` per hour.
pub fn charge(base_price: Decimal, occupancy_ratio: Decimal, parked_minutes: Decimal) -> Decimal {
    let hours = parked_minutes.max(Decimal::ZERO) / MINUTES_PER_HOUR;
    round_currency(base_price * hours * occupancy_multiplier(occupancy_ratio))
}

/// Whole minutes between two instants; a partial minute is not billed.
/// An end before the start counts as zero.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    Decimal::from((end - start).num_minutes().max(0))
}

/// Round half-up (away from zero) to two decimal places
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Money as integer cents, for storage
pub fn to_cents(amount: Decimal) -> i64 {
    (round_currency(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(i64::MAX)
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Money as a JSON-friendly float
pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

/// Convert a reported float price into a decimal, rejecting NaN/inf and negatives.
pub fn decimal_from_f64(value: f64, field: &str) -> DomainResult<Decimal> {
    let decimal = Decimal::try_from(value)
        .map_err(|_| DomainError::Validation(format!("{} is not a finite number", field)))?;
    if decimal.is_sign_negative() && !decimal.is_zero() {
        return Err(DomainError::Validation(format!("{} must not be negative", field)));
    }
    Ok(round_currency(decimal).normalize())
}

// ── Tests ──────────────────────────────────────────────────────
