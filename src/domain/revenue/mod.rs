//! Revenue aggregate

pub mod model;
pub mod repository;

pub use model::{RevenueCharge, RevenueRecord};
pub use repository::RevenueRepository;
