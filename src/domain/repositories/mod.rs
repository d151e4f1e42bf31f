//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: read access to every per-aggregate repository plus
//!   the single atomic write path `commit`
//! - `ChangeSet`: the unit of work written by `commit`
//! - `DomainResult`: standard result type for domain operations

use async_trait::async_trait;

use super::revenue::{RevenueCharge, RevenueRepository};
use super::sector::{Sector, SectorRepository};
use super::spot::{Spot, SpotRepository};
use super::vehicle::{VehicleEntry, VehicleRepository};
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── ChangeSet ──────────────────────────────────────────────────

/// Any subset of {sector, spot, vehicle entry, revenue increment} written
/// as one atomic unit. Records are full upserts keyed by their identity;
/// the revenue charge is added to the existing (date, sector) total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub sector: Option<Sector>,
    pub spot: Option<Spot>,
    pub vehicle: Option<VehicleEntry>,
    pub revenue: Option<RevenueCharge>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sector(mut self, sector: Sector) -> Self {
        self.sector = Some(sector);
        self
    }

    pub fn with_spot(mut self, spot: Spot) -> Self {
        self.spot = Some(spot);
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleEntry) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    pub fn with_revenue(mut self, charge: RevenueCharge) -> Self {
        self.revenue = Some(charge);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sector.is_none() && self.spot.is_none() && self.vehicle.is_none() && self.revenue.is_none()
    }
}

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Reads go through the per-aggregate repositories; every write goes
/// through `commit` so that multi-record updates are all-or-nothing:
///
/// ```ignore
/// async fn park(repos: &dyn RepositoryProvider, plate: &str) -> DomainResult<()> {
///     let entry = repos.vehicles().find_active(plate).await?;
///     // ...
///     repos.commit(ChangeSet::new().with_vehicle(entry).with_spot(spot)).await
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn sectors(&self) -> &dyn SectorRepository;
    fn spots(&self) -> &dyn SpotRepository;
    fn vehicles(&self) -> &dyn VehicleRepository;
    fn revenues(&self) -> &dyn RevenueRepository;

    async fn commit(&self, changes: ChangeSet) -> DomainResult<()>;
}
