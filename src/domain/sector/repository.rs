//! Sector repository interface

use async_trait::async_trait;

use super::model::Sector;
use crate::domain::DomainResult;

#[async_trait]
pub trait SectorRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Sector>>;
    async fn find_all(&self) -> DomainResult<Vec<Sector>>;
}
