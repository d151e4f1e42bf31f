pub mod health;
pub mod metrics;
pub mod parking;
pub mod webhook;
