//! # Garage Service
//!
//! Tracks vehicles through a parking garage (ENTRY → PARKED → EXIT),
//! keeps sector and spot occupancy, prices stays by occupancy tier and
//! books daily revenue per sector. A background poller reconciles local
//! occupancy with the garage simulator's feed.
//!
//! ## Architecture
//!
//! - **domain**: entities, pricing, outcomes and repository traits
//! - **application**: occupancy store, lifecycle engine, revenue ledger,
//!   status queries and the reconciliation poller
//! - **infrastructure**: in-memory and SeaORM storage, HTTP feed client
//! - **interfaces**: axum REST API
//! - **shared**: errors, clock, shutdown, retry and keyed locks

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

pub use interfaces::http::create_api_router;
