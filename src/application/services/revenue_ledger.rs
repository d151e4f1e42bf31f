//! Revenue ledger: per (date, sector) accumulator

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{ChangeSet, DomainError, DomainResult, RepositoryProvider, RevenueCharge};

pub struct RevenueLedger {
    repos: Arc<dyn RepositoryProvider>,
}

impl RevenueLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Validate a charge for (date, sector) without writing it.
    ///
    /// The lifecycle engine commits the result together with the spot release.
    pub fn charge(&self, date: NaiveDate, sector_name: &str, amount: Decimal) -> DomainResult<RevenueCharge> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::Validation("revenue charge must not be negative".into()));
        }
        if sector_name.trim().is_empty() {
            return Err(DomainError::Validation("revenue sector must not be blank".into()));
        }
        Ok(RevenueCharge::new(date, sector_name, amount))
    }

    /// Add `amount` to the (date, sector) total, creating it if absent.
    pub async fn add_charge(&self, date: NaiveDate, sector_name: &str, amount: Decimal) -> DomainResult<()> {
        let charge = self.charge(date, sector_name, amount)?;
        self.repos.commit(ChangeSet::new().with_revenue(charge)).await?;
        info!(%date, sector = sector_name, charge = %amount, "Revenue booked");
        Ok(())
    }

    /// Total for (date, sector); zero when nothing was booked.
    pub async fn get_revenue(&self, date: NaiveDate, sector_name: &str) -> DomainResult<Decimal> {
        Ok(self
            .repos
            .revenues()
            .find(date, sector_name)
            .await?
            .map(|r| r.amount)
            .unwrap_or(Decimal::ZERO))
    }
}
