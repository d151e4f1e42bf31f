//! Create revenues table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Revenues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Revenues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Revenues::Date).date().not_null())
                    .col(ColumnDef::new(Revenues::SectorName).string().not_null())
                    .col(
                        ColumnDef::new(Revenues::AmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Target of the ON CONFLICT increment
        manager
            .create_index(
                Index::create()
                    .name("idx_revenues_date_sector")
                    .table(Revenues::Table)
                    .col(Revenues::Date)
                    .col(Revenues::SectorName)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Revenues::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Revenues {
    Table,
    Id,
    Date,
    SectorName,
    AmountCents,
}
