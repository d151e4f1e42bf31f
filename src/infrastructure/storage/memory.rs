//! In-memory repository provider
//!
//! All state sits behind one `tokio::sync::RwLock`, so a `commit` is applied
//! in full before any reader can observe it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    ChangeSet, DomainResult, RepositoryProvider, RevenueRecord, RevenueRepository, Sector,
    SectorRepository, Spot, SpotId, SpotRepository, VehicleEntry, VehicleRepository,
};

#[derive(Default)]
struct State {
    sectors: HashMap<String, Sector>,
    spots: HashMap<SpotId, Spot>,
    vehicles: HashMap<Uuid, VehicleEntry>,
    /// Insertion order of vehicle entries
    vehicle_order: Vec<Uuid>,
    revenues: HashMap<(NaiveDate, String), RevenueRecord>,
}

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    state: RwLock<State>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SectorRepository for InMemoryRepositoryProvider {
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Sector>> {
        Ok(self.state.read().await.sectors.get(name).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<Sector>> {
        let state = self.state.read().await;
        let mut sectors: Vec<Sector> = state.sectors.values().cloned().collect();
        sectors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sectors)
    }
}

#[async_trait]
impl SpotRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: SpotId) -> DomainResult<Option<Spot>> {
        Ok(self.state.read().await.spots.get(&id).cloned())
    }

    async fn find_by_coordinates(&self, lat: f64, lng: f64) -> DomainResult<Option<Spot>> {
        let state = self.state.read().await;
        Ok(state.spots.values().find(|s| s.is_at(lat, lng)).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<Spot>> {
        let state = self.state.read().await;
        let mut spots: Vec<Spot> = state.spots.values().cloned().collect();
        spots.sort_by_key(|s| s.id);
        Ok(spots)
    }
}

#[async_trait]
impl VehicleRepository for InMemoryRepositoryProvider {
    async fn find_active(&self, plate: &str) -> DomainResult<Option<VehicleEntry>> {
        let state = self.state.read().await;
        Ok(state
            .vehicles
            .values()
            .find(|v| v.license_plate == plate && v.is_active())
            .cloned())
    }

    async fn find_parked_on(&self, spot_id: SpotId) -> DomainResult<Option<VehicleEntry>> {
        let state = self.state.read().await;
        Ok(state
            .vehicles
            .values()
            .find(|v| v.is_parked() && v.assigned_spot == Some(spot_id))
            .cloned())
    }

    async fn find_latest(&self, plate: &str) -> DomainResult<Option<VehicleEntry>> {
        let state = self.state.read().await;
        // Latest entry time wins; on ties, the later insertion.
        Ok(state
            .vehicle_order
            .iter()
            .filter_map(|id| state.vehicles.get(id))
            .filter(|v| v.license_plate == plate)
            .max_by_key(|v| v.entry_time)
            .cloned())
    }
}

#[async_trait]
impl RevenueRepository for InMemoryRepositoryProvider {
    async fn find(&self, date: NaiveDate, sector_name: &str) -> DomainResult<Option<RevenueRecord>> {
        let state = self.state.read().await;
        Ok(state.revenues.get(&(date, sector_name.to_string())).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<RevenueRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<RevenueRecord> = state.revenues.values().cloned().collect();
        records.sort_by(|a, b| (a.date, &a.sector_name).cmp(&(b.date, &b.sector_name)));
        Ok(records)
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn sectors(&self) -> &dyn SectorRepository {
        self
    }

    fn spots(&self) -> &dyn SpotRepository {
        self
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        self
    }

    fn revenues(&self) -> &dyn RevenueRepository {
        self
    }

    async fn commit(&self, changes: ChangeSet) -> DomainResult<()> {
        let mut state = self.state.write().await;

        if let Some(sector) = changes.sector {
            state.sectors.insert(sector.name.clone(), sector);
        }
        if let Some(spot) = changes.spot {
            state.spots.insert(spot.id, spot);
        }
        if let Some(vehicle) = changes.vehicle {
            if state.vehicles.insert(vehicle.id, vehicle.clone()).is_none() {
                state.vehicle_order.push(vehicle.id);
            }
        }
        if let Some(charge) = changes.revenue {
            let key = (charge.date, charge.sector_name.clone());
            let existing = state.revenues.remove(&key);
            state.revenues.insert(key, charge.apply_to(existing));
        }
        Ok(())
    }
}
