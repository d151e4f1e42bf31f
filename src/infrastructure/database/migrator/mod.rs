//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_sectors;
mod m20250101_000002_create_spots;
mod m20250101_000003_create_vehicle_entries;
mod m20250101_000004_create_revenues;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_sectors::Migration),
            Box::new(m20250101_000002_create_spots::Migration),
            Box::new(m20250101_000003_create_vehicle_entries::Migration),
            Box::new(m20250101_000004_create_revenues::Migration),
        ]
    }
}
