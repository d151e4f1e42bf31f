//! Lifecycle engine
//!
//! The single writer of vehicle, occupancy and revenue state. Every
//! operation serialises on the plate, then the spot, then the sector, and
//! writes its result with one `commit`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::occupancy::OccupancyStore;
use super::revenue_ledger::RevenueLedger;
use crate::domain::pricing;
use crate::domain::{
    ChangeSet, DomainError, DomainResult, Outcome, RepositoryProvider, Sector,
    SkipReason, SpotId, VehicleEntry,
};
use crate::shared::types::SharedClock;
use crate::shared::utills::KeyedLocks;

/// Result of a completed exit
#[derive(Debug, Clone, PartialEq)]
pub struct ExitReceipt {
    pub license_plate: String,
    /// Sector billed; `None` when the vehicle never parked
    pub sector: Option<String>,
    pub spot_id: Option<SpotId>,
    pub charge: Decimal,
    pub parked_minutes: Decimal,
}

pub struct LifecycleEngine {
    repos: Arc<dyn RepositoryProvider>,
    occupancy: Arc<OccupancyStore>,
    ledger: Arc<RevenueLedger>,
    plate_locks: KeyedLocks<String>,
    clock: SharedClock,
}

impl LifecycleEngine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        occupancy: Arc<OccupancyStore>,
        ledger: Arc<RevenueLedger>,
        clock: SharedClock,
    ) -> Self {
        Self {
            repos,
            occupancy,
            ledger,
            plate_locks: KeyedLocks::new("plate"),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open a visit for `plate`. The first registration wins while a visit is active.
    pub async fn register_entry(
        &self,
        plate: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Outcome<VehicleEntry>> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(DomainError::Validation("license_plate must not be blank".into()));
        }

        let result = self.register_locked(plate, entry_time).await;
        record("entry", &result);
        result
    }

    async fn register_locked(
        &self,
        plate: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Outcome<VehicleEntry>> {
        let _plate_guard = self.plate_locks.lock(plate.to_string()).await;

        if let Some(active) = self.repos.vehicles().find_active(plate).await? {
            warn!(plate, status = %active.status, "Vehicle already inside, ignoring entry");
            return Ok(Outcome::Skipped(SkipReason::DuplicateEntry));
        }

        let entry = VehicleEntry::new(plate, entry_time);
        self.repos
            .commit(ChangeSet::new().with_vehicle(entry.clone()))
            .await?;

        info!(plate, %entry_time, "Vehicle entered");
        Ok(Outcome::Applied(entry))
    }

    /// Park the active vehicle `plate` on the spot at (lat, lng).
    ///
    /// Preconditions, each a silent skip: an active visit exists, a spot is
    /// at the coordinates, its sector has capacity, the spot is free.
    pub async fn assign_spot(&self, plate: &str, lat: f64, lng: f64) -> DomainResult<Outcome<VehicleEntry>> {
        let plate = plate.trim();
        let result = if plate.is_empty() {
            Ok(Outcome::Skipped(SkipReason::BlankPlate))
        } else {
            self.assign_locked(plate, lat, lng).await
        };
        record("park", &result);
        result
    }

    async fn assign_locked(&self, plate: &str, lat: f64, lng: f64) -> DomainResult<Outcome<VehicleEntry>> {
        let _plate_guard = self.plate_locks.lock(plate.to_string()).await;

        let Some(mut entry) = self.repos.vehicles().find_active(plate).await? else {
            warn!(plate, "No active visit, cannot park");
            return Ok(Outcome::Skipped(SkipReason::VehicleNotFound));
        };
        if entry.is_parked() {
            debug!(plate, spot_id = ?entry.assigned_spot, "Vehicle already parked");
            return Ok(Outcome::Skipped(SkipReason::AlreadyParked));
        }

        let Some(located) = self.occupancy.find_spot_by_coordinates(lat, lng).await? else {
            warn!(plate, lat, lng, "No spot at coordinates");
            return Ok(Outcome::Skipped(SkipReason::SpotNotFound));
        };

        let _spot_guard = self.occupancy.lock_spot(located.id).await;
        // Re-read under the lock: a concurrent assignment may have taken it.
        let Some(mut spot) = self.occupancy.find_spot(located.id).await? else {
            return Ok(Outcome::Skipped(SkipReason::SpotNotFound));
        };

        let _sector_guard = self.occupancy.lock_sector(&spot.sector).await;
        let Some(mut sector) = self.occupancy.find_sector_by_name(&spot.sector).await? else {
            warn!(plate, spot_id = spot.id, sector = %spot.sector, "Spot sector missing");
            return Ok(Outcome::Skipped(SkipReason::SectorNotFound));
        };

        // Sector capacity is checked before the spot; nothing is written on a skip.
        if !sector.try_occupy() {
            warn!(plate, sector = %sector.name, max_capacity = sector.max_capacity, "Sector full");
            return Ok(Outcome::Skipped(SkipReason::SectorFull));
        }
        if spot.occupied {
            warn!(plate, spot_id = spot.id, "Spot already occupied");
            return Ok(Outcome::Skipped(SkipReason::SpotOccupied));
        }

        let parked_at = self.clock.now();
        spot.occupied = true;
        entry.park(spot.id, parked_at);

        self.repos
            .commit(
                ChangeSet::new()
                    .with_sector(sector.clone())
                    .with_spot(spot.clone())
                    .with_vehicle(entry.clone()),
            )
            .await?;

        publish_occupancy(&sector);
        info!(
            plate,
            spot_id = spot.id,
            sector = %sector.name,
            occupied = sector.current_occupied,
            "Vehicle parked"
        );
        Ok(Outcome::Applied(entry))
    }

    /// Close the active visit of `plate`, billing it when it was parked.
    pub async fn handle_exit(&self, plate: &str, exit_time: DateTime<Utc>) -> DomainResult<Outcome<ExitReceipt>> {
        let result = self.exit(plate, exit_time, None).await;
        record("exit", &result);
        result
    }

    /// Exit whichever vehicle is parked on `spot_id` (feed reported the spot free).
    pub async fn release_spot(&self, spot_id: SpotId, at: DateTime<Utc>) -> DomainResult<Outcome<ExitReceipt>> {
        let result = match self.repos.vehicles().find_parked_on(spot_id).await? {
            Some(entry) => self.exit(&entry.license_plate, at, Some(spot_id)).await,
            None => {
                debug!(spot_id, "No parked vehicle on released spot");
                Ok(Outcome::Skipped(SkipReason::VehicleNotFound))
            }
        };
        record("release", &result);
        result
    }

    async fn exit(
        &self,
        plate: &str,
        exit_time: DateTime<Utc>,
        expected_spot: Option<SpotId>,
    ) -> DomainResult<Outcome<ExitReceipt>> {
        let plate = plate.trim();
        if plate.is_empty() {
            debug!("Blank plate on exit, ignoring");
            return Ok(Outcome::Skipped(SkipReason::BlankPlate));
        }

        let _plate_guard = self.plate_locks.lock(plate.to_string()).await;

        let Some(mut entry) = self.repos.vehicles().find_active(plate).await? else {
            warn!(plate, "No active visit, ignoring exit");
            return Ok(Outcome::Skipped(SkipReason::VehicleNotFound));
        };
        if expected_spot.is_some() && entry.assigned_spot != expected_spot {
            debug!(plate, spot_id = ?expected_spot, "Vehicle moved before release");
            return Ok(Outcome::Skipped(SkipReason::SpotMismatch));
        }

        let mut receipt = ExitReceipt {
            license_plate: plate.to_string(),
            sector: None,
            spot_id: entry.assigned_spot,
            charge: Decimal::ZERO,
            parked_minutes: Decimal::ZERO,
        };

        let Some(spot_id) = entry.assigned_spot.filter(|_| entry.is_parked()) else {
            entry.close(exit_time);
            self.repos.commit(ChangeSet::new().with_vehicle(entry)).await?;
            info!(plate, %exit_time, "Vehicle left without parking");
            return Ok(Outcome::Applied(receipt));
        };

        let _spot_guard = self.occupancy.lock_spot(spot_id).await;
        let Some(mut spot) = self.occupancy.find_spot(spot_id).await? else {
            warn!(plate, spot_id, "Assigned spot missing, closing visit without charge");
            entry.close(exit_time);
            self.repos.commit(ChangeSet::new().with_vehicle(entry)).await?;
            return Ok(Outcome::Applied(receipt));
        };

        let _sector_guard = self.occupancy.lock_sector(&spot.sector).await;
        let sector = self.occupancy.find_sector_by_name(&spot.sector).await?;

        spot.occupied = false;
        let mut changes = ChangeSet::new().with_spot(spot.clone());

        if let Some(mut sector) = sector {
            let minutes = pricing::minutes_between(entry.billable_since(), exit_time);
            // Priced against occupancy before this vehicle leaves.
            let amount = pricing::charge(sector.base_price, sector.occupancy_ratio(), minutes);
            let revenue = self.ledger.charge(exit_time.date_naive(), &sector.name, amount)?;
            sector.release();

            changes = changes.with_revenue(revenue).with_sector(sector.clone());

            receipt.sector = Some(sector.name.clone());
            receipt.charge = amount;
            receipt.parked_minutes = minutes;

            entry.close(exit_time);
            self.repos.commit(changes.with_vehicle(entry)).await?;
            publish_occupancy(&sector);
        } else {
            warn!(plate, spot_id, sector = %spot.sector, "Spot sector missing, releasing without charge");
            entry.close(exit_time);
            self.repos.commit(changes.with_vehicle(entry)).await?;
        }

        info!(
            plate,
            spot_id,
            sector = receipt.sector.as_deref().unwrap_or("-"),
            charge = %receipt.charge,
            minutes = %receipt.parked_minutes.round_dp(2),
            "Vehicle exited"
        );
        Ok(Outcome::Applied(receipt))
    }
}

fn record<T>(operation: &'static str, result: &DomainResult<Outcome<T>>) {
    let outcome = match result {
        Ok(outcome) => outcome.label(),
        Err(_) => "error",
    };
    metrics::counter!("parking_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

fn publish_occupancy(sector: &Sector) {
    metrics::gauge!("sector_occupied", "sector" => sector.name.clone()).set(sector.current_occupied as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::Fixture;
    use crate::domain::VehicleStatus;
    use crate::shared::types::Clock;
    use chrono::{Duration, NaiveDate};

    #[tokio::test]
    async fn duplicate_entry_keeps_first_registration() {
        let fx = Fixture::with_sector("A", 10, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();

        let first = fx.engine.register_entry("ABC1234", t0).await.unwrap();
        assert!(first.is_applied());
        let second = fx
            .engine
            .register_entry("ABC1234", t0 + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(second.skip_reason(), Some(SkipReason::DuplicateEntry));

        let active = fx.repos.vehicles().find_active("ABC1234").await.unwrap().unwrap();
        assert_eq!(active.entry_time, t0);
    }

    #[tokio::test]
    async fn blank_plate_entry_is_a_validation_error() {
        let fx = Fixture::with_sector("A", 10, &[]).await;
        let err = fx.engine.register_entry("  ", fx.clock.now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn assign_checks_preconditions() {
        let fx = Fixture::with_sector("A", 1, &[(1, 1.0, 1.0), (2, 2.0, 2.0)]).await;
        let now = fx.clock.now();

        let outcome = fx.engine.assign_spot("NOPE", 1.0, 1.0).await.unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::VehicleNotFound));

        fx.engine.register_entry("AAA0001", now).await.unwrap();
        let outcome = fx.engine.assign_spot("AAA0001", 9.0, 9.0).await.unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::SpotNotFound));

        assert!(fx.engine.assign_spot("AAA0001", 1.0, 1.0).await.unwrap().is_applied());
        let outcome = fx.engine.assign_spot("AAA0001", 2.0, 2.0).await.unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::AlreadyParked));

        // Capacity 1: the second vehicle finds the sector full before the spot check.
        fx.engine.register_entry("BBB0002", now).await.unwrap();
        let outcome = fx.engine.assign_spot("BBB0002", 2.0, 2.0).await.unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::SectorFull));
    }

    #[tokio::test]
    async fn occupied_spot_is_not_reassigned() {
        let fx = Fixture::with_sector("A", 10, &[(1, 1.0, 1.0)]).await;
        let now = fx.clock.now();
        fx.engine.register_entry("AAA0001", now).await.unwrap();
        fx.engine.register_entry("BBB0002", now).await.unwrap();

        fx.engine.assign_spot("AAA0001", 1.0, 1.0).await.unwrap();
        let outcome = fx.engine.assign_spot("BBB0002", 1.0, 1.0).await.unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::SpotOccupied));
        assert_eq!(fx.occupied("A").await, 1);
    }

    #[tokio::test]
    async fn concurrent_assignments_of_one_spot_yield_one_success() {
        let fx = Fixture::with_sector("A", 10, &[(1, 1.0, 1.0)]).await;
        let now = fx.clock.now();
        let plates = ["AAA0001", "BBB0002", "CCC0003", "DDD0004"];
        for plate in plates {
            fx.engine.register_entry(plate, now).await.unwrap();
        }

        let mut tasks = Vec::new();
        for plate in plates {
            let engine = fx.engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.assign_spot(plate, 1.0, 1.0).await.unwrap().is_applied()
            }));
        }
        let mut successes = 0;
        for t in tasks {
            if t.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(fx.occupied("A").await, 1);
    }

    #[tokio::test]
    async fn full_visit_bills_and_restores_occupancy() {
        let fx = Fixture::with_sector("A", 100, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();

        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();
        assert_eq!(fx.occupied("A").await, 1);

        let exit_time = t0 + Duration::seconds(3600);
        let receipt = fx
            .engine
            .handle_exit("ABC1234", exit_time)
            .await
            .unwrap()
            .applied()
            .unwrap();

        // 1/100 occupied → 0.90 × 10.00 × 1h
        assert_eq!(receipt.charge, Decimal::new(900, 2));
        assert_eq!(receipt.sector.as_deref(), Some("A"));

        let latest = fx.repos.vehicles().find_latest("ABC1234").await.unwrap().unwrap();
        assert_eq!(latest.status, VehicleStatus::Exit);
        assert_eq!(latest.assigned_spot, None);
        assert!(!fx.repos.spots().find_by_id(1).await.unwrap().unwrap().occupied);
        assert_eq!(fx.occupied("A").await, 0);

        let revenue = fx.ledger.get_revenue(exit_time.date_naive(), "A").await.unwrap();
        assert_eq!(revenue, Decimal::new(900, 2));
    }

    #[tokio::test]
    async fn exit_bills_whole_minutes_only() {
        let fx = Fixture::with_sector("A", 100, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();

        let receipt = fx
            .engine
            .handle_exit("ABC1234", t0 + Duration::seconds(90))
            .await
            .unwrap()
            .applied()
            .unwrap();
        // 1 minute at 10.00/h × 0.90
        assert_eq!(receipt.parked_minutes, Decimal::ONE);
        assert_eq!(receipt.charge, Decimal::new(15, 2));
    }

    #[tokio::test]
    async fn full_sector_skip_writes_nothing() {
        let fx = Fixture::with_sector("A", 1, &[(1, 1.0, 1.0), (2, 2.0, 2.0)]).await;
        let now = fx.clock.now();
        fx.engine.register_entry("AAA0001", now).await.unwrap();
        fx.engine.register_entry("BBB0002", now).await.unwrap();
        fx.engine.assign_spot("AAA0001", 1.0, 1.0).await.unwrap();

        let outcome = fx.engine.assign_spot("BBB0002", 2.0, 2.0).await.unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::SectorFull));
        assert_eq!(fx.occupied("A").await, 1);
        assert!(!fx.repos.spots().find_by_id(2).await.unwrap().unwrap().occupied);
        let waiting = fx.repos.vehicles().find_active("BBB0002").await.unwrap().unwrap();
        assert_eq!(waiting.status, VehicleStatus::Entry);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_assignments_respect_sector_capacity() {
        for _ in 0..20 {
            let fx = Fixture::with_sector("A", 1, &[(1, 1.0, 1.0), (2, 2.0, 2.0)]).await;
            let now = fx.clock.now();
            fx.engine.register_entry("AAA0001", now).await.unwrap();
            fx.engine.register_entry("BBB0002", now).await.unwrap();

            let a = fx.engine.clone();
            let b = fx.engine.clone();
            let ta = tokio::spawn(async move { a.assign_spot("AAA0001", 1.0, 1.0).await.unwrap() });
            let tb = tokio::spawn(async move { b.assign_spot("BBB0002", 2.0, 2.0).await.unwrap() });
            let outcomes = [ta.await.unwrap(), tb.await.unwrap()];

            let applied = outcomes.iter().filter(|o| o.is_applied()).count();
            assert_eq!(applied, 1);
            assert!(outcomes
                .iter()
                .any(|o| o.skip_reason() == Some(SkipReason::SectorFull)));
            assert_eq!(fx.occupied("A").await, 1);

            let occupied_spots = fx
                .repos
                .spots()
                .find_all()
                .await
                .unwrap()
                .into_iter()
                .filter(|s| s.occupied)
                .count();
            assert_eq!(occupied_spots, 1);
        }
    }

    #[tokio::test]
    async fn exit_without_parking_books_nothing() {
        let fx = Fixture::with_sector("A", 10, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();

        let receipt = fx
            .engine
            .handle_exit("ABC1234", t0 + Duration::hours(2))
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(receipt.charge, Decimal::ZERO);
        assert!(receipt.sector.is_none());
        assert!(fx.repos.revenues().find_all().await.unwrap().is_empty());

        // EXIT is terminal; a later exit finds nothing to close.
        let again = fx.engine.handle_exit("ABC1234", t0 + Duration::hours(3)).await.unwrap();
        assert_eq!(again.skip_reason(), Some(SkipReason::VehicleNotFound));
    }

    #[tokio::test]
    async fn blank_or_unknown_exit_is_a_no_op() {
        let fx = Fixture::with_sector("A", 10, &[]).await;
        let now = fx.clock.now();
        assert_eq!(
            fx.engine.handle_exit("", now).await.unwrap().skip_reason(),
            Some(SkipReason::BlankPlate)
        );
        assert_eq!(
            fx.engine.handle_exit("ZZZ9999", now).await.unwrap().skip_reason(),
            Some(SkipReason::VehicleNotFound)
        );
    }

    #[tokio::test]
    async fn concurrent_exits_bill_once() {
        let fx = Fixture::with_sector("A", 100, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();

        let exit_time = t0 + Duration::hours(1);
        let a = fx.engine.clone();
        let b = fx.engine.clone();
        let (ra, rb) = tokio::join!(
            a.handle_exit("ABC1234", exit_time),
            b.handle_exit("ABC1234", exit_time)
        );
        let applied = [ra.unwrap(), rb.unwrap()].iter().filter(|o| o.is_applied()).count();
        assert_eq!(applied, 1);

        let total = fx
            .repos
            .revenues()
            .find(exit_time.date_naive(), "A")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(total.amount, Decimal::new(900, 2));
    }

    #[tokio::test]
    async fn re_entry_after_exit_starts_a_new_visit() {
        let fx = Fixture::with_sector("A", 10, &[]).await;
        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.handle_exit("ABC1234", t0 + Duration::minutes(1)).await.unwrap();

        let outcome = fx
            .engine
            .register_entry("ABC1234", t0 + Duration::minutes(10))
            .await
            .unwrap();
        let entry = outcome.applied().unwrap();
        assert_eq!(entry.status, VehicleStatus::Entry);
        assert_eq!(entry.entry_time, t0 + Duration::minutes(10));
    }

    #[tokio::test]
    async fn revenue_date_follows_exit_time() {
        let fx = Fixture::with_sector("A", 100, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();

        let next_day = t0 + Duration::days(1);
        fx.engine.handle_exit("ABC1234", next_day).await.unwrap();

        let dates: Vec<NaiveDate> = fx
            .repos
            .revenues()
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![next_day.date_naive()]);
    }

    #[tokio::test]
    async fn release_spot_exits_the_parked_vehicle() {
        let fx = Fixture::with_sector("A", 10, &[(1, 1.0, 1.0)]).await;
        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();

        let receipt = fx
            .engine
            .release_spot(1, t0 + Duration::minutes(30))
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(receipt.license_plate, "ABC1234");
        assert_eq!(fx.occupied("A").await, 0);

        let again = fx.engine.release_spot(1, t0 + Duration::minutes(31)).await.unwrap();
        assert_eq!(again.skip_reason(), Some(SkipReason::VehicleNotFound));
    }
}
