//! Infrastructure layer - external concerns

pub mod database;
pub mod snapshot_client;
pub mod storage;

pub use database::{connect, init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use snapshot_client::HttpSnapshotSource;
pub use storage::InMemoryRepositoryProvider;
