//! Daily revenue per sector

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Accumulated revenue for one (date, sector). Never decreases within a day.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRecord {
    pub date: NaiveDate,
    pub sector_name: String,
    pub amount: Decimal,
}

/// An increment to be added to a revenue record
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueCharge {
    pub date: NaiveDate,
    pub sector_name: String,
    pub amount: Decimal,
}

impl RevenueCharge {
    pub fn new(date: NaiveDate, sector_name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            sector_name: sector_name.into(),
            amount,
        }
    }

    /// Fold this charge into an existing record (or start one).
    pub fn apply_to(&self, existing: Option<RevenueRecord>) -> RevenueRecord {
        let base = existing.map(|r| r.amount).unwrap_or(Decimal::ZERO);
        RevenueRecord {
            date: self.date,
            sector_name: self.sector_name.clone(),
            amount: base + self.amount.max(Decimal::ZERO),
        }
    }
}
