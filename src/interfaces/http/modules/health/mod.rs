//! Liveness and component health

pub mod handlers;

pub use handlers::*;
