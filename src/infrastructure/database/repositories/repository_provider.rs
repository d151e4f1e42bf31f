//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use tracing::debug;

use crate::domain::pricing::to_cents;
use crate::domain::repositories::{ChangeSet, RepositoryProvider};
use crate::domain::revenue::RevenueRepository;
use crate::domain::sector::SectorRepository;
use crate::domain::spot::SpotRepository;
use crate::domain::vehicle::VehicleRepository;
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{revenue, sector, spot, vehicle_entry};

use super::db_err;
use super::revenue_repository::SeaOrmRevenueRepository;
use super::sector_repository::{self, SeaOrmSectorRepository};
use super::spot_repository::{self, SeaOrmSpotRepository};
use super::vehicle_repository::{self, SeaOrmVehicleRepository};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
/// `commit` writes a whole `ChangeSet` inside one transaction.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let spot = repos.spots().find_by_coordinates(-23.56, -46.65).await?;
/// repos.commit(ChangeSet::new().with_spot(spot)).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    sectors: SeaOrmSectorRepository,
    spots: SeaOrmSpotRepository,
    vehicles: SeaOrmVehicleRepository,
    revenues: SeaOrmRevenueRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            sectors: SeaOrmSectorRepository::new(db.clone()),
            spots: SeaOrmSpotRepository::new(db.clone()),
            vehicles: SeaOrmVehicleRepository::new(db.clone()),
            revenues: SeaOrmRevenueRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn sectors(&self) -> &dyn SectorRepository {
        &self.sectors
    }

    fn spots(&self) -> &dyn SpotRepository {
        &self.spots
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }

    fn revenues(&self) -> &dyn RevenueRepository {
        &self.revenues
    }

    async fn commit(&self, changes: ChangeSet) -> DomainResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on an early return rolls it back.
        let txn = self.db.begin().await.map_err(db_err)?;

        if let Some(s) = &changes.sector {
            sector::Entity::insert(sector_repository::domain_to_active(s))
                .on_conflict(
                    OnConflict::column(sector::Column::Name)
                        .update_columns([
                            sector::Column::BasePriceCents,
                            sector::Column::MaxCapacity,
                            sector::Column::OpenHour,
                            sector::Column::CloseHour,
                            sector::Column::DurationLimitMinutes,
                            sector::Column::CurrentOccupied,
                            sector::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        if let Some(s) = &changes.spot {
            spot::Entity::insert(spot_repository::domain_to_active(s))
                .on_conflict(
                    OnConflict::column(spot::Column::Id)
                        .update_columns([
                            spot::Column::Lat,
                            spot::Column::Lng,
                            spot::Column::Occupied,
                            spot::Column::SectorName,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        if let Some(v) = &changes.vehicle {
            vehicle_entry::Entity::insert(vehicle_repository::domain_to_active(v))
                .on_conflict(
                    OnConflict::column(vehicle_entry::Column::Id)
                        .update_columns([
                            vehicle_entry::Column::Status,
                            vehicle_entry::Column::ParkedTime,
                            vehicle_entry::Column::ExitTime,
                            vehicle_entry::Column::SpotId,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        if let Some(charge) = &changes.revenue {
            let cents = to_cents(charge.amount).max(0);
            let model = revenue::ActiveModel {
                id: NotSet,
                date: Set(charge.date),
                sector_name: Set(charge.sector_name.clone()),
                amount_cents: Set(cents),
            };
            revenue::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([revenue::Column::Date, revenue::Column::SectorName])
                        .value(
                            revenue::Column::AmountCents,
                            Expr::col((revenue::Entity, revenue::Column::AmountCents)).add(cents),
                        )
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        debug!(
            sector = changes.sector.is_some(),
            spot = changes.spot.is_some(),
            vehicle = changes.vehicle.is_some(),
            revenue = changes.revenue.is_some(),
            "Change set committed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RevenueCharge, Sector, SectorConfig, Spot, VehicleEntry, VehicleStatus};
    use crate::infrastructure::database::{connect, DatabaseConfig};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    async fn provider() -> SeaOrmRepositoryProvider {
        let db = connect(&DatabaseConfig::memory(), true).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    fn sector(name: &str, max_capacity: u32) -> Sector {
        Sector::new(SectorConfig {
            name: name.into(),
            base_price: Decimal::new(1050, 2),
            max_capacity,
            open_hour: "06:00".into(),
            close_hour: "22:00".into(),
            duration_limit_minutes: 240,
        })
    }

    #[tokio::test]
    async fn sector_round_trips_and_updates() {
        let repos = provider().await;
        let mut s = sector("A", 10);
        repos.commit(ChangeSet::new().with_sector(s.clone())).await.unwrap();
        assert_eq!(repos.sectors().find_by_name("A").await.unwrap(), Some(s.clone()));

        s.try_occupy();
        repos.commit(ChangeSet::new().with_sector(s.clone())).await.unwrap();
        let stored = repos.sectors().find_by_name("A").await.unwrap().unwrap();
        assert_eq!(stored.current_occupied, 1);
        assert_eq!(stored.base_price, Decimal::new(1050, 2));
    }

    #[tokio::test]
    async fn parked_vehicle_is_found_by_spot_and_plate() {
        let repos = provider().await;
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let mut spot = Spot::new(3, "A", -23.561684, -46.655981);
        spot.occupied = true;
        let mut entry = VehicleEntry::new("ABC1234", t0);
        entry.park(3, t0);

        repos
            .commit(
                ChangeSet::new()
                    .with_sector(sector("A", 10))
                    .with_spot(spot.clone())
                    .with_vehicle(entry.clone()),
            )
            .await
            .unwrap();

        assert_eq!(
            repos.spots().find_by_coordinates(-23.561684, -46.655981).await.unwrap(),
            Some(spot)
        );
        assert_eq!(repos.vehicles().find_parked_on(3).await.unwrap(), Some(entry.clone()));
        assert_eq!(repos.vehicles().find_active("ABC1234").await.unwrap(), Some(entry.clone()));

        entry.close(t0 + chrono::Duration::hours(1));
        repos.commit(ChangeSet::new().with_vehicle(entry)).await.unwrap();
        assert!(repos.vehicles().find_active("ABC1234").await.unwrap().is_none());
        let latest = repos.vehicles().find_latest("ABC1234").await.unwrap().unwrap();
        assert_eq!(latest.status, VehicleStatus::Exit);
        assert_eq!(latest.assigned_spot, None);
    }

    #[tokio::test]
    async fn revenue_increments_accumulate() {
        let repos = provider().await;
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for cents in [900, 1125] {
            repos
                .commit(ChangeSet::new().with_revenue(RevenueCharge::new(date, "A", Decimal::new(cents, 2))))
                .await
                .unwrap();
        }
        let record = repos.revenues().find(date, "A").await.unwrap().unwrap();
        assert_eq!(record.amount, Decimal::new(2025, 2));
        assert_eq!(repos.revenues().find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_commit_writes_nothing() {
        let repos = provider().await;
        repos
            .commit(ChangeSet::new().with_spot(Spot::new(1, "A", 1.0, 1.0)))
            .await
            .unwrap();

        // Spot 2 collides with spot 1's coordinates: the sector in the same
        // change set must not be written either.
        let result = repos
            .commit(
                ChangeSet::new()
                    .with_sector(sector("B", 5))
                    .with_spot(Spot::new(2, "B", 1.0, 1.0)),
            )
            .await;

        assert!(result.is_err());
        assert!(repos.sectors().find_by_name("B").await.unwrap().is_none());
    }
}
