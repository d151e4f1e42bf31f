//! Create spots table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Spots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Spots::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Spots::Lat).double().not_null())
                    .col(ColumnDef::new(Spots::Lng).double().not_null())
                    .col(
                        ColumnDef::new(Spots::Occupied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Spots::SectorName).string().not_null())
                    .to_owned(),
            )
            .await?;

        // One spot per coordinate pair
        manager
            .create_index(
                Index::create()
                    .name("idx_spots_lat_lng")
                    .table(Spots::Table)
                    .col(Spots::Lat)
                    .col(Spots::Lng)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_spots_sector_name")
                    .table(Spots::Table)
                    .col(Spots::SectorName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Spots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Spots {
    Table,
    Id,
    Lat,
    Lng,
    Occupied,
    SectorName,
}
