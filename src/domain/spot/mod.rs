//! Spot aggregate

pub mod model;
pub mod repository;

pub use model::{Spot, SpotId};
pub use repository::SpotRepository;
