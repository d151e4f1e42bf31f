//! Vehicle ledger aggregate
//!
//! One lifecycle record per visit of a license plate:
//! `ENTRY → PARKED → EXIT` or `ENTRY → EXIT`.

pub mod model;
pub mod repository;

pub use model::{synthetic_plate, VehicleEntry, VehicleStatus, SYNTHETIC_PLATE_PREFIX};
pub use repository::VehicleRepository;
