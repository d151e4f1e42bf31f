//! Spot repository interface

use async_trait::async_trait;

use super::model::{Spot, SpotId};
use crate::domain::DomainResult;

#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn find_by_id(&self, id: SpotId) -> DomainResult<Option<Spot>>;
    /// Exact coordinate match
    async fn find_by_coordinates(&self, lat: f64, lng: f64) -> DomainResult<Option<Spot>>;
    async fn find_all(&self) -> DomainResult<Vec<Spot>>;
}
