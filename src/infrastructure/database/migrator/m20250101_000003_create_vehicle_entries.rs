//! Create vehicle_entries table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VehicleEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VehicleEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VehicleEntries::LicensePlate).string().not_null())
                    .col(
                        ColumnDef::new(VehicleEntries::Status)
                            .string_len(10)
                            .not_null()
                            .default("ENTRY"),
                    )
                    .col(
                        ColumnDef::new(VehicleEntries::EntryTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VehicleEntries::ParkedTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(VehicleEntries::ExitTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(VehicleEntries::SpotId).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_entries_plate_status")
                    .table(VehicleEntries::Table)
                    .col(VehicleEntries::LicensePlate)
                    .col(VehicleEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_entries_spot_id")
                    .table(VehicleEntries::Table)
                    .col(VehicleEntries::SpotId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VehicleEntries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum VehicleEntries {
    Table,
    Id,
    LicensePlate,
    Status,
    EntryTime,
    ParkedTime,
    ExitTime,
    SpotId,
}
