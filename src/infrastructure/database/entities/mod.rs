//! Database entities module

pub mod revenue;
pub mod sector;
pub mod spot;
pub mod vehicle_entry;

pub use revenue::Entity as Revenue;
pub use sector::Entity as Sector;
pub use spot::Entity as Spot;
pub use vehicle_entry::Entity as VehicleEntry;
