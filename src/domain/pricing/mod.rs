//! Pricing calculator

pub mod model;

pub use model::{
    charge, decimal_from_f64, from_cents, minutes_between, occupancy_multiplier, round_currency,
    to_cents, to_f64, PriceTier, PRICE_TIERS,
};
