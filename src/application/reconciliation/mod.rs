//! Reconciliation with the garage occupancy feed
//!
//! The feed is treated as ground truth for sector configuration, spot
//! layout and spot occupancy. Differences in occupancy are replayed through
//! the lifecycle engine as synthetic entries and exits.

mod poller;
mod snapshot;

pub use poller::{PollerConfig, ReconcileReport, ReconciliationPoller};
pub use snapshot::{GarageSnapshot, SectorSnapshot, SnapshotSource, SpotSnapshot};
