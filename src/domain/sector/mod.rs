//! Sector aggregate
//!
//! A named zone of the garage with its own tariff, capacity and
//! occupancy counter.

pub mod model;
pub mod repository;

pub use model::{Sector, SectorConfig};
pub use repository::SectorRepository;
