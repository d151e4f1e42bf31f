pub mod reconciliation;
pub mod services;

// Re-export key types for convenience
pub use reconciliation::{
    GarageSnapshot, PollerConfig, ReconcileReport, ReconciliationPoller, SnapshotSource,
};
pub use services::{
    ExitReceipt, GarageView, LifecycleEngine, OccupancyStore, PlateStatus, QueryService,
    RevenueLedger, RevenueSummary, SpotLayout, SpotStatus,
};
