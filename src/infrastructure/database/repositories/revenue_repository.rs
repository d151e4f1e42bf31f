//! SeaORM implementation of RevenueRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::db_err;
use crate::domain::pricing::from_cents;
use crate::domain::revenue::{RevenueRecord, RevenueRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::revenue;

fn entity_to_domain(r: revenue::Model) -> RevenueRecord {
    RevenueRecord {
        date: r.date,
        sector_name: r.sector_name,
        amount: from_cents(r.amount_cents),
    }
}

pub struct SeaOrmRevenueRepository {
    db: DatabaseConnection,
}

impl SeaOrmRevenueRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RevenueRepository for SeaOrmRevenueRepository {
    async fn find(&self, date: NaiveDate, sector_name: &str) -> DomainResult<Option<RevenueRecord>> {
        let model = revenue::Entity::find()
            .filter(revenue::Column::Date.eq(date))
            .filter(revenue::Column::SectorName.eq(sector_name))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<RevenueRecord>> {
        let models = revenue::Entity::find()
            .order_by_asc(revenue::Column::Date)
            .order_by_asc(revenue::Column::SectorName)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }
}
