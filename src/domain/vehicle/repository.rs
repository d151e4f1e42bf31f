//! Vehicle ledger repository interface

use async_trait::async_trait;

use super::model::VehicleEntry;
use crate::domain::spot::SpotId;
use crate::domain::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// The non-EXIT entry for a plate, if any
    async fn find_active(&self, plate: &str) -> DomainResult<Option<VehicleEntry>>;
    /// The PARKED entry referencing a spot, if any
    async fn find_parked_on(&self, spot_id: SpotId) -> DomainResult<Option<VehicleEntry>>;
    /// Most recent entry for a plate regardless of status
    async fn find_latest(&self, plate: &str) -> DomainResult<Option<VehicleEntry>>;
}
