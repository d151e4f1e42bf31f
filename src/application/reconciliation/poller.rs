//! Reconciliation Poller
//!
//! Periodically fetches the garage snapshot and replays it: sectors and
//! spots are upserted through the occupancy store, occupancy differences go
//! through the lifecycle engine with synthetic plates. The poller never
//! writes occupancy itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::snapshot::{GarageSnapshot, SnapshotSource};
use crate::application::services::{LifecycleEngine, OccupancyStore, SpotLayout};
use crate::domain::{synthetic_plate, DomainResult, Outcome, SkipReason, Spot};
use crate::shared::errors::{AppError, InfraError};
use crate::shared::shutdown::ShutdownSignal;
use crate::shared::utills::{retry_with_backoff, RetryConfig};

/// Configuration for the poll loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Wait before the first poll so the feed can come up
    pub initial_delay: Duration,
    pub fetch_retry: RetryConfig,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            initial_delay: Duration::from_secs(5),
            fetch_retry: RetryConfig::attempts(2),
        }
    }
}

/// What one reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub sectors_upserted: usize,
    pub spots_upserted: usize,
    pub vehicles_parked: usize,
    pub vehicles_released: usize,
    /// Records ignored because they were invalid or their preconditions failed
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        *self == Self {
            skipped: self.skipped,
            ..Self::default()
        }
    }
}

pub struct ReconciliationPoller {
    source: Arc<dyn SnapshotSource>,
    occupancy: Arc<OccupancyStore>,
    engine: Arc<LifecycleEngine>,
    config: PollerConfig,
    running: Arc<RwLock<bool>>,
}

impl ReconciliationPoller {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        occupancy: Arc<OccupancyStore>,
        engine: Arc<LifecycleEngine>,
    ) -> Self {
        Self {
            source,
            occupancy,
            engine,
            config: PollerConfig::default(),
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn with_config(mut self, config: PollerConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the background poll loop
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            *self.running.write().await = true;

            info!(
                interval_ms = self.config.interval.as_millis() as u64,
                initial_delay_ms = self.config.initial_delay.as_millis() as u64,
                "🔄 Reconciliation poller started"
            );

            let stopped_early = tokio::select! {
                _ = tokio::time::sleep(self.config.initial_delay) => false,
                _ = shutdown.notified().wait() => true,
            };

            if !stopped_early {
                let mut interval = tokio::time::interval(self.config.interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            // Errors are logged inside; the next tick retries.
                            let _ = self.poll_once().await;
                        }
                        _ = shutdown.notified().wait() => {
                            info!("🔄 Reconciliation poller shutting down");
                            break;
                        }
                    }
                }
            }

            *self.running.write().await = false;
            info!("🔄 Reconciliation poller stopped");
        })
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Fetch one snapshot and reconcile it. A failed fetch changes nothing.
    pub async fn poll_once(&self) -> Result<ReconcileReport, AppError> {
        let source = self.source.clone();
        let fetched = retry_with_backoff(
            self.config.fetch_retry.clone(),
            || {
                let source = source.clone();
                async move { source.fetch().await }
            },
            InfraError::is_transient,
            "garage_snapshot",
        )
        .await;

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                metrics::counter!("reconciliation_polls_total", "result" => "fetch_error").increment(1);
                warn!(error = %e, "Garage snapshot fetch failed, will retry next tick");
                return Err(e.into());
            }
        };

        match self.reconcile(snapshot).await {
            Ok(report) => {
                metrics::counter!("reconciliation_polls_total", "result" => "ok").increment(1);
                if report.is_noop() {
                    debug!(skipped = report.skipped, "Garage snapshot already in sync");
                } else {
                    info!(
                        sectors = report.sectors_upserted,
                        spots = report.spots_upserted,
                        parked = report.vehicles_parked,
                        released = report.vehicles_released,
                        skipped = report.skipped,
                        "Garage snapshot reconciled"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                metrics::counter!("reconciliation_polls_total", "result" => "storage_error").increment(1);
                error!(error = %e, "Reconciliation failed");
                Err(e.into())
            }
        }
    }

    /// Apply a snapshot: sectors first, then spots and their occupancy.
    pub async fn reconcile(&self, snapshot: GarageSnapshot) -> DomainResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for reported in &snapshot.garage {
            let config = match reported.to_config() {
                Ok(config) if !config.name.is_empty() => config,
                Ok(_) => {
                    warn!("Sector without a name in snapshot");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(sector = %reported.sector, error = %e, "Invalid sector in snapshot");
                    report.skipped += 1;
                    continue;
                }
            };
            if self.occupancy.upsert_sector(config).await?.is_applied() {
                report.sectors_upserted += 1;
            }
        }

        for reported in &snapshot.spots {
            let Some(id) = reported.id else {
                warn!(sector = %reported.sector, "Spot without id in snapshot");
                report.skipped += 1;
                continue;
            };

            let layout = SpotLayout {
                id,
                sector: reported.sector.trim().to_string(),
                lat: reported.lat,
                lng: reported.lng,
            };
            match self.occupancy.upsert_spot(layout).await? {
                Outcome::Applied(_) => report.spots_upserted += 1,
                Outcome::Skipped(reason) if reason != SkipReason::Unchanged => {
                    report.skipped += 1;
                }
                Outcome::Skipped(_) => {}
            }

            let Some(local) = self.occupancy.find_spot(id).await? else {
                continue;
            };
            if local.occupied == reported.occupied {
                continue;
            }

            if reported.occupied {
                if self.park_synthetic(&local).await? {
                    report.vehicles_parked += 1;
                } else {
                    report.skipped += 1;
                }
            } else {
                match self.engine.release_spot(id, self.engine.now()).await? {
                    Outcome::Applied(receipt) => {
                        debug!(spot_id = id, plate = %receipt.license_plate, "Feed released spot");
                        report.vehicles_released += 1;
                    }
                    Outcome::Skipped(reason) => {
                        warn!(spot_id = id, reason = %reason, "Could not release spot reported free");
                        report.skipped += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Drive an unknown vehicle onto `spot` through the normal entry and park path.
    ///
    /// A synthetic visit that cannot park is closed again in the same pass, so
    /// no unparked synthetic vehicle outlives the poll.
    async fn park_synthetic(&self, spot: &Spot) -> DomainResult<bool> {
        let plate = synthetic_plate(spot.id);
        let now = self.engine.now();

        self.engine.register_entry(&plate, now).await?;
        match self.engine.assign_spot(&plate, spot.lat, spot.lng).await? {
            Outcome::Applied(_) => {
                debug!(spot_id = spot.id, plate = %plate, "Feed occupied spot");
                Ok(true)
            }
            Outcome::Skipped(SkipReason::AlreadyParked) => {
                debug!(spot_id = spot.id, plate = %plate, "Synthetic vehicle already parked");
                Ok(false)
            }
            Outcome::Skipped(reason) => {
                warn!(spot_id = spot.id, plate = %plate, reason = %reason, "Could not park synthetic vehicle");
                self.engine.handle_exit(&plate, now).await?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use crate::application::reconciliation::{SectorSnapshot, SpotSnapshot};
    use crate::application::services::test_support::Fixture;
    use crate::domain::{RepositoryProvider, VehicleStatus};
    use crate::shared::types::Clock;

    /// Serves whatever snapshot was last set, or fails when empty
    struct StaticSource {
        snapshot: Mutex<Option<GarageSnapshot>>,
        calls: AtomicU32,
    }

    impl StaticSource {
        fn new(snapshot: Option<GarageSnapshot>) -> Arc<Self> {
            Arc::new(Self {
                snapshot: Mutex::new(snapshot),
                calls: AtomicU32::new(0),
            })
        }

        fn set(&self, snapshot: GarageSnapshot) {
            *self.snapshot.lock().unwrap() = Some(snapshot);
        }
    }

    #[async_trait]
    impl SnapshotSource for StaticSource {
        async fn fetch(&self) -> Result<GarageSnapshot, InfraError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.snapshot
                .lock()
                .unwrap()
                .clone()
                .ok_or(InfraError::UnexpectedStatus {
                    status: 404,
                    url: "http://feed/garage".into(),
                })
        }
    }

    fn snapshot(spots: &[(i64, f64, f64, bool)]) -> GarageSnapshot {
        GarageSnapshot {
            garage: vec![SectorSnapshot {
                sector: "A".into(),
                base_price: 10.0,
                max_capacity: 10,
                open_hour: "00:00".into(),
                close_hour: "23:59".into(),
                duration_limit_minutes: 1440,
            }],
            spots: spots
                .iter()
                .map(|&(id, lat, lng, occupied)| SpotSnapshot {
                    id: Some(id),
                    sector: "A".into(),
                    lat,
                    lng,
                    occupied,
                })
                .collect(),
        }
    }

    fn poller(fx: &Fixture, source: Arc<StaticSource>) -> ReconciliationPoller {
        ReconciliationPoller::new(source, fx.occupancy.clone(), fx.engine.clone()).with_config(PollerConfig {
            interval: Duration::from_millis(10),
            initial_delay: Duration::ZERO,
            fetch_retry: RetryConfig {
                max_attempts: 1,
                ..RetryConfig::default()
            },
        })
    }

    #[tokio::test]
    async fn first_poll_creates_layout() {
        let fx = Fixture::new();
        let source = StaticSource::new(Some(snapshot(&[(1, 1.0, 1.0, false), (2, 2.0, 2.0, false)])));
        let report = poller(&fx, source).poll_once().await.unwrap();

        assert_eq!(report.sectors_upserted, 1);
        assert_eq!(report.spots_upserted, 2);
        assert_eq!(fx.repos.spots().find_all().await.unwrap().len(), 2);
        assert_eq!(fx.occupied("A").await, 0);
    }

    #[tokio::test]
    async fn occupied_spot_is_parked_once_across_polls() {
        let fx = Fixture::new();
        let source = StaticSource::new(Some(snapshot(&[(1, 1.0, 1.0, false)])));
        let poller = poller(&fx, source.clone());
        poller.poll_once().await.unwrap();

        source.set(snapshot(&[(1, 1.0, 1.0, true)]));
        let first = poller.poll_once().await.unwrap();
        let second = poller.poll_once().await.unwrap();

        assert_eq!(first.vehicles_parked, 1);
        assert!(second.is_noop());
        assert_eq!(fx.occupied("A").await, 1);

        let entry = fx
            .repos
            .vehicles()
            .find_parked_on(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.license_plate, "SIMULATED-SPOT-1");
        assert_eq!(entry.status, VehicleStatus::Parked);
    }

    #[tokio::test]
    async fn newly_discovered_occupied_spot_goes_through_engine() {
        let fx = Fixture::new();
        let source = StaticSource::new(Some(snapshot(&[(7, 1.0, 1.0, true)])));
        let report = poller(&fx, source).poll_once().await.unwrap();

        assert_eq!(report.spots_upserted, 1);
        assert_eq!(report.vehicles_parked, 1);
        assert!(fx.repos.spots().find_by_id(7).await.unwrap().unwrap().occupied);
        assert_eq!(fx.occupied("A").await, 1);
    }

    #[tokio::test]
    async fn spot_reported_free_bills_the_parked_vehicle() {
        let fx = Fixture::new();
        let source = StaticSource::new(Some(snapshot(&[(1, 1.0, 1.0, false)])));
        let poller = poller(&fx, source.clone());
        poller.poll_once().await.unwrap();

        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();

        // Feed agrees with the webhook: nothing to do.
        source.set(snapshot(&[(1, 1.0, 1.0, true)]));
        assert!(poller.poll_once().await.unwrap().is_noop());

        fx.clock.advance(ChronoDuration::hours(1));
        source.set(snapshot(&[(1, 1.0, 1.0, false)]));
        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.vehicles_released, 1);
        assert_eq!(fx.occupied("A").await, 0);
        let exited = fx.repos.vehicles().find_latest("ABC1234").await.unwrap().unwrap();
        assert_eq!(exited.status, VehicleStatus::Exit);
        let revenue = fx
            .repos
            .revenues()
            .find(fx.clock.now().date_naive(), "A")
            .await
            .unwrap()
            .unwrap();
        // 1/10 occupied → 0.90 × 10.00 × 1h
        assert_eq!(revenue.amount, rust_decimal::Decimal::new(900, 2));
    }

    #[tokio::test]
    async fn unparkable_synthetic_visit_is_closed() {
        let fx = Fixture::new();
        let mut layout = snapshot(&[(1, 1.0, 1.0, false), (2, 2.0, 2.0, false)]);
        layout.garage[0].max_capacity = 1;
        let source = StaticSource::new(Some(layout.clone()));
        let poller = poller(&fx, source.clone());
        poller.poll_once().await.unwrap();

        let t0 = fx.clock.now();
        fx.engine.register_entry("ABC1234", t0).await.unwrap();
        fx.engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap();

        // Feed claims spot 2 too, but the sector is already full.
        layout.spots[0].occupied = true;
        layout.spots[1].occupied = true;
        source.set(layout.clone());
        let report = poller.poll_once().await.unwrap();
        assert_eq!(report.vehicles_parked, 0);
        assert_eq!(report.skipped, 1);

        let phantom = fx.repos.vehicles().find_active("SIMULATED-SPOT-2").await.unwrap();
        assert!(phantom.is_none());
        let closed = fx
            .repos
            .vehicles()
            .find_latest("SIMULATED-SPOT-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, VehicleStatus::Exit);

        layout.spots[1].occupied = false;
        source.set(layout);
        assert!(poller.poll_once().await.unwrap().is_noop());
        assert!(fx
            .repos
            .vehicles()
            .find_active("SIMULATED-SPOT-2")
            .await
            .unwrap()
            .is_none());
        assert_eq!(fx.occupied("A").await, 1);
        assert!(fx.repos.revenues().find_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn webhook_and_poller_race_for_one_spot() {
        for _ in 0..20 {
            let fx = Fixture::new();
            let source = StaticSource::new(Some(snapshot(&[(1, 1.0, 1.0, false)])));
            let poller = Arc::new(poller(&fx, source.clone()));
            poller.poll_once().await.unwrap();

            fx.engine.register_entry("ABC1234", fx.clock.now()).await.unwrap();
            source.set(snapshot(&[(1, 1.0, 1.0, true)]));

            let engine = fx.engine.clone();
            let webhook = tokio::spawn(async move { engine.assign_spot("ABC1234", 1.0, 1.0).await.unwrap() });
            let feed = {
                let poller = poller.clone();
                tokio::spawn(async move { poller.poll_once().await.unwrap() })
            };
            webhook.await.unwrap();
            feed.await.unwrap();

            assert_eq!(fx.occupied("A").await, 1);
            let parked = fx.repos.vehicles().find_parked_on(1).await.unwrap().unwrap();
            if parked.license_plate == "ABC1234" {
                assert!(fx
                    .repos
                    .vehicles()
                    .find_active("SIMULATED-SPOT-1")
                    .await
                    .unwrap()
                    .is_none());
            } else {
                assert_eq!(parked.license_plate, "SIMULATED-SPOT-1");
                let waiting = fx.repos.vehicles().find_active("ABC1234").await.unwrap().unwrap();
                assert_eq!(waiting.status, VehicleStatus::Entry);
            }
        }
    }

    #[tokio::test]
    async fn failed_fetch_changes_nothing() {
        let fx = Fixture::new();
        let source = StaticSource::new(None);
        let result = poller(&fx, source.clone()).poll_once().await;

        assert!(result.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(fx.repos.sectors().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn spots_of_unknown_sectors_are_skipped() {
        let fx = Fixture::new();
        let mut snap = snapshot(&[(1, 1.0, 1.0, true)]);
        snap.spots[0].sector = "Z".into();
        let report = poller(&fx, StaticSource::new(Some(snap))).poll_once().await.unwrap();

        assert_eq!(report.spots_upserted, 0);
        assert_eq!(report.skipped, 1);
        assert!(fx.repos.spots().find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn loop_polls_until_shutdown() {
        let fx = Fixture::new();
        let source = StaticSource::new(Some(snapshot(&[(1, 1.0, 1.0, false)])));
        let poller = Arc::new(poller(&fx, source.clone()));
        let shutdown = ShutdownSignal::new();

        let handle = poller.clone().start(shutdown.clone());
        tokio::time::timeout(Duration::from_secs(2), async {
            while source.calls.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("poller should tick");

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller should stop")
            .unwrap();
        assert!(!poller.is_running().await);
        assert!(fx.repos.spots().find_by_id(1).await.unwrap().is_some());
    }
}
