//! Revenue repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::RevenueRecord;
use crate::domain::DomainResult;

#[async_trait]
pub trait RevenueRepository: Send + Sync {
    async fn find(&self, date: NaiveDate, sector_name: &str) -> DomainResult<Option<RevenueRecord>>;
    async fn find_all(&self) -> DomainResult<Vec<RevenueRecord>>;
}
