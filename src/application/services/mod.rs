//! Application services

mod lifecycle;
mod occupancy;
mod queries;
mod revenue_ledger;

pub use lifecycle::{ExitReceipt, LifecycleEngine};
pub use occupancy::{OccupancyStore, SpotLayout};
pub use queries::{GarageView, PlateStatus, QueryService, RevenueSummary, SpotStatus};
pub use revenue_ledger::RevenueLedger;
