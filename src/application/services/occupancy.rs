//! Occupancy store
//!
//! Owns sector and spot records and the per-key locks that guard them.
//! Configuration updates (from the garage feed) go through `upsert_sector`
//! and `upsert_spot`; occupancy counters are only changed by the lifecycle
//! engine while it holds the same locks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    ChangeSet, DomainResult, Outcome, RepositoryProvider, Sector, SectorConfig, SkipReason, Spot,
    SpotId,
};
use crate::shared::utills::{KeyedGuard, KeyedLocks};

/// Reported location and owner of a spot
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLayout {
    pub id: SpotId,
    pub sector: String,
    pub lat: f64,
    pub lng: f64,
}

pub struct OccupancyStore {
    repos: Arc<dyn RepositoryProvider>,
    spot_locks: KeyedLocks<SpotId>,
    sector_locks: KeyedLocks<String>,
}

impl OccupancyStore {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            repos,
            spot_locks: KeyedLocks::new("spot"),
            sector_locks: KeyedLocks::new("sector"),
        }
    }

    pub(crate) async fn lock_spot(&self, id: SpotId) -> KeyedGuard<SpotId> {
        self.spot_locks.lock(id).await
    }

    pub(crate) async fn lock_sector(&self, name: &str) -> KeyedGuard<String> {
        self.sector_locks.lock(name.to_string()).await
    }

    /// Create a sector on first sight or apply changed configuration.
    pub async fn upsert_sector(&self, config: SectorConfig) -> DomainResult<Outcome<Sector>> {
        let _guard = self.lock_sector(&config.name).await;

        let sector = match self.repos.sectors().find_by_name(&config.name).await? {
            None => {
                let sector = Sector::new(config);
                info!(
                    sector = %sector.name,
                    base_price = %sector.base_price,
                    max_capacity = sector.max_capacity,
                    "Sector created"
                );
                sector
            }
            Some(mut sector) => {
                if !sector.apply_config(&config) {
                    return Ok(Outcome::Skipped(SkipReason::Unchanged));
                }
                if sector.max_capacity != config.max_capacity {
                    warn!(
                        sector = %sector.name,
                        reported = config.max_capacity,
                        occupied = sector.current_occupied,
                        "Reported capacity below occupancy, keeping occupancy as capacity"
                    );
                }
                info!(
                    sector = %sector.name,
                    base_price = %sector.base_price,
                    max_capacity = sector.max_capacity,
                    "Sector updated"
                );
                sector
            }
        };

        self.repos
            .commit(ChangeSet::new().with_sector(sector.clone()))
            .await?;
        Ok(Outcome::Applied(sector))
    }

    /// Create a free spot or apply a changed location/sector.
    ///
    /// The spot's sector must already exist. A sector change is deferred while
    /// the spot is occupied so the vehicle is billed and released against the
    /// sector it entered.
    pub async fn upsert_spot(&self, layout: SpotLayout) -> DomainResult<Outcome<Spot>> {
        let _guard = self.lock_spot(layout.id).await;

        if self.repos.sectors().find_by_name(&layout.sector).await?.is_none() {
            warn!(spot_id = layout.id, sector = %layout.sector, "Spot references unknown sector");
            return Ok(Outcome::Skipped(SkipReason::SectorNotFound));
        }

        if let Some(other) = self
            .repos
            .spots()
            .find_by_coordinates(layout.lat, layout.lng)
            .await?
        {
            if other.id != layout.id {
                warn!(
                    spot_id = layout.id,
                    other_spot_id = other.id,
                    lat = layout.lat,
                    lng = layout.lng,
                    "Coordinates already used by another spot"
                );
                return Ok(Outcome::Skipped(SkipReason::CoordinatesTaken));
            }
        }

        let spot = match self.repos.spots().find_by_id(layout.id).await? {
            None => {
                let spot = Spot::new(layout.id, layout.sector, layout.lat, layout.lng);
                info!(spot_id = spot.id, sector = %spot.sector, "Spot created");
                spot
            }
            Some(mut spot) => {
                let mut changed = false;
                if !spot.is_at(layout.lat, layout.lng) {
                    spot.lat = layout.lat;
                    spot.lng = layout.lng;
                    changed = true;
                }
                if spot.sector != layout.sector {
                    if spot.occupied {
                        debug!(
                            spot_id = spot.id,
                            from = %spot.sector,
                            to = %layout.sector,
                            "Sector change deferred while occupied"
                        );
                    } else {
                        spot.sector = layout.sector;
                        changed = true;
                    }
                }
                if !changed {
                    return Ok(Outcome::Skipped(SkipReason::Unchanged));
                }
                info!(spot_id = spot.id, sector = %spot.sector, lat = spot.lat, lng = spot.lng, "Spot updated");
                spot
            }
        };

        self.repos.commit(ChangeSet::new().with_spot(spot.clone())).await?;
        Ok(Outcome::Applied(spot))
    }

    pub async fn find_spot_by_coordinates(&self, lat: f64, lng: f64) -> DomainResult<Option<Spot>> {
        self.repos.spots().find_by_coordinates(lat, lng).await
    }

    pub async fn find_spot(&self, id: SpotId) -> DomainResult<Option<Spot>> {
        self.repos.spots().find_by_id(id).await
    }

    pub async fn find_sector_by_name(&self, name: &str) -> DomainResult<Option<Sector>> {
        self.repos.sectors().find_by_name(name).await
    }

    pub async fn list_sectors(&self) -> DomainResult<Vec<Sector>> {
        self.repos.sectors().find_all().await
    }

    pub async fn list_spots(&self) -> DomainResult<Vec<Spot>> {
        self.repos.spots().find_all().await
    }

    /// Free places across all sectors
    pub async fn available_spots(&self) -> DomainResult<u32> {
        Ok(self.list_sectors().await?.iter().map(Sector::available).sum())
    }
}
