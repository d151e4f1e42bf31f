//! Read-only status queries
//!
//! "Price so far" projections use the exit pricing formula with the current
//! sector occupancy and the current time as the end of the stay.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::occupancy::OccupancyStore;
use super::revenue_ledger::RevenueLedger;
use crate::domain::pricing;
use crate::domain::{
    DomainError, DomainResult, RepositoryProvider, Sector, Spot, SpotId, VehicleEntry,
    VehicleStatus,
};
use crate::shared::types::SharedClock;

#[derive(Debug, Clone, PartialEq)]
pub struct PlateStatus {
    pub license_plate: String,
    pub status: VehicleStatus,
    pub price_until_now: Decimal,
    pub entry_time: DateTime<Utc>,
    pub parked_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub spot_id: Option<SpotId>,
    pub sector: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotStatus {
    pub spot_id: SpotId,
    pub sector: String,
    pub occupied: bool,
    pub license_plate: Option<String>,
    pub price_until_now: Decimal,
    pub entry_time: Option<DateTime<Utc>>,
    pub parked_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueSummary {
    pub date: NaiveDate,
    pub sector: String,
    pub amount: Decimal,
    pub currency: String,
    /// Start of the day, UTC
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarageView {
    pub sectors: Vec<Sector>,
    pub spots: Vec<Spot>,
    pub available_spots: u32,
}

pub struct QueryService {
    repos: Arc<dyn RepositoryProvider>,
    occupancy: Arc<OccupancyStore>,
    revenue: Arc<RevenueLedger>,
    clock: SharedClock,
    currency: String,
}

impl QueryService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        occupancy: Arc<OccupancyStore>,
        revenue: Arc<RevenueLedger>,
        clock: SharedClock,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            occupancy,
            revenue,
            clock,
            currency: currency.into(),
        }
    }

    /// Latest visit of a plate, with the running price while it is parked.
    pub async fn plate_status(&self, plate: &str) -> DomainResult<PlateStatus> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(DomainError::Validation("license_plate must not be blank".into()));
        }

        let entry = self
            .repos
            .vehicles()
            .find_latest(plate)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Vehicle",
                field: "license_plate",
                value: plate.to_string(),
            })?;

        let spot = match entry.assigned_spot {
            Some(id) => self.occupancy.find_spot(id).await?,
            None => None,
        };
        let price_until_now = match &spot {
            Some(spot) if entry.is_parked() => self.price_so_far(&entry, spot).await?,
            _ => Decimal::ZERO,
        };

        Ok(PlateStatus {
            license_plate: entry.license_plate.clone(),
            status: entry.status,
            price_until_now,
            entry_time: entry.entry_time,
            parked_time: entry.parked_time,
            exit_time: entry.exit_time,
            spot_id: entry.assigned_spot,
            sector: spot.as_ref().map(|s| s.sector.clone()),
            lat: spot.as_ref().map(|s| s.lat),
            lng: spot.as_ref().map(|s| s.lng),
        })
    }

    /// Spot at (lat, lng) and the vehicle parked on it, if any.
    pub async fn spot_status(&self, lat: f64, lng: f64) -> DomainResult<SpotStatus> {
        let spot = self
            .occupancy
            .find_spot_by_coordinates(lat, lng)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Spot",
                field: "coordinates",
                value: format!("{},{}", lat, lng),
            })?;

        let entry = self.repos.vehicles().find_parked_on(spot.id).await?;
        let price_until_now = match &entry {
            Some(entry) => self.price_so_far(entry, &spot).await?,
            None => Decimal::ZERO,
        };

        Ok(SpotStatus {
            spot_id: spot.id,
            sector: spot.sector.clone(),
            occupied: spot.occupied,
            license_plate: entry.as_ref().map(|e| e.license_plate.clone()),
            price_until_now,
            entry_time: entry.as_ref().map(|e| e.entry_time),
            parked_time: entry.as_ref().and_then(|e| e.parked_time),
        })
    }

    pub async fn revenue(&self, date: NaiveDate, sector: &str) -> DomainResult<RevenueSummary> {
        let sector = sector.trim();
        if sector.is_empty() {
            return Err(DomainError::Validation("sector must not be blank".into()));
        }
        let amount = self.revenue.get_revenue(date, sector).await?;

        Ok(RevenueSummary {
            date,
            sector: sector.to_string(),
            amount,
            currency: self.currency.clone(),
            timestamp: date.and_time(chrono::NaiveTime::MIN).and_utc(),
        })
    }

    pub async fn garage(&self) -> DomainResult<GarageView> {
        let sectors = self.occupancy.list_sectors().await?;
        let spots = self.occupancy.list_spots().await?;
        let available_spots = sectors.iter().map(Sector::available).sum();
        Ok(GarageView {
            sectors,
            spots,
            available_spots,
        })
    }

    async fn price_so_far(&self, entry: &VehicleEntry, spot: &Spot) -> DomainResult<Decimal> {
        let Some(sector) = self.occupancy.find_sector_by_name(&spot.sector).await? else {
            return Ok(Decimal::ZERO);
        };
        let minutes = pricing::minutes_between(entry.billable_since(), self.clock.now());
        Ok(pricing::charge(sector.base_price, sector.occupancy_ratio(), minutes))
    }
}
