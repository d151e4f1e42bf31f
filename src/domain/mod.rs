pub mod outcome;
pub mod pricing;
pub mod repositories;
pub mod revenue;
pub mod sector;
pub mod spot;
pub mod vehicle;

// Re-export commonly used types
pub use outcome::{Outcome, SkipReason};
pub use repositories::{ChangeSet, DomainResult, RepositoryProvider};
pub use revenue::{RevenueCharge, RevenueRecord, RevenueRepository};
pub use sector::{Sector, SectorConfig, SectorRepository};
pub use spot::{Spot, SpotId, SpotRepository};
pub use vehicle::{synthetic_plate, VehicleEntry, VehicleRepository, VehicleStatus};

pub use crate::shared::errors::DomainError;
