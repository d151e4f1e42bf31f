//! SeaORM implementation of VehicleRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use super::db_err;
use crate::domain::spot::SpotId;
use crate::domain::vehicle::{VehicleEntry, VehicleRepository, VehicleStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::vehicle_entry;

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(s: vehicle_entry::VehicleStatus) -> VehicleStatus {
    match s {
        vehicle_entry::VehicleStatus::Entry => VehicleStatus::Entry,
        vehicle_entry::VehicleStatus::Parked => VehicleStatus::Parked,
        vehicle_entry::VehicleStatus::Exit => VehicleStatus::Exit,
    }
}

fn status_to_entity(s: VehicleStatus) -> vehicle_entry::VehicleStatus {
    match s {
        VehicleStatus::Entry => vehicle_entry::VehicleStatus::Entry,
        VehicleStatus::Parked => vehicle_entry::VehicleStatus::Parked,
        VehicleStatus::Exit => vehicle_entry::VehicleStatus::Exit,
    }
}

pub(super) fn entity_to_domain(v: vehicle_entry::Model) -> DomainResult<VehicleEntry> {
    let id = Uuid::parse_str(&v.id)
        .map_err(|e| DomainError::Storage(format!("Corrupt vehicle entry id {}: {}", v.id, e)))?;
    Ok(VehicleEntry {
        id,
        license_plate: v.license_plate,
        entry_time: v.entry_time,
        parked_time: v.parked_time,
        exit_time: v.exit_time,
        assigned_spot: v.spot_id,
        status: status_to_domain(v.status),
    })
}

pub(super) fn domain_to_active(v: &VehicleEntry) -> vehicle_entry::ActiveModel {
    vehicle_entry::ActiveModel {
        id: Set(v.id.to_string()),
        license_plate: Set(v.license_plate.clone()),
        status: Set(status_to_entity(v.status)),
        entry_time: Set(v.entry_time),
        parked_time: Set(v.parked_time),
        exit_time: Set(v.exit_time),
        spot_id: Set(v.assigned_spot),
    }
}

// ── SeaOrmVehicleRepository ─────────────────────────────────────

pub struct SeaOrmVehicleRepository {
    db: DatabaseConnection,
}

impl SeaOrmVehicleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VehicleRepository for SeaOrmVehicleRepository {
    async fn find_active(&self, plate: &str) -> DomainResult<Option<VehicleEntry>> {
        vehicle_entry::Entity::find()
            .filter(vehicle_entry::Column::LicensePlate.eq(plate))
            .filter(vehicle_entry::Column::Status.ne(vehicle_entry::VehicleStatus::Exit))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn find_parked_on(&self, spot_id: SpotId) -> DomainResult<Option<VehicleEntry>> {
        vehicle_entry::Entity::find()
            .filter(vehicle_entry::Column::SpotId.eq(spot_id))
            .filter(vehicle_entry::Column::Status.eq(vehicle_entry::VehicleStatus::Parked))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }

    async fn find_latest(&self, plate: &str) -> DomainResult<Option<VehicleEntry>> {
        vehicle_entry::Entity::find()
            .filter(vehicle_entry::Column::LicensePlate.eq(plate))
            .order_by_desc(vehicle_entry::Column::EntryTime)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .transpose()
    }
}
