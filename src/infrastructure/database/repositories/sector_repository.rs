//! SeaORM implementation of SectorRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

use super::db_err;
use crate::domain::pricing::{from_cents, to_cents};
use crate::domain::sector::{Sector, SectorRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::sector;

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn entity_to_domain(s: sector::Model) -> Sector {
    Sector {
        name: s.name,
        base_price: from_cents(s.base_price_cents),
        max_capacity: s.max_capacity.max(0) as u32,
        open_hour: s.open_hour,
        close_hour: s.close_hour,
        duration_limit_minutes: s.duration_limit_minutes.max(0) as u32,
        current_occupied: s.current_occupied.max(0) as u32,
    }
}

pub(super) fn domain_to_active(s: &Sector) -> sector::ActiveModel {
    sector::ActiveModel {
        name: Set(s.name.clone()),
        base_price_cents: Set(to_cents(s.base_price)),
        max_capacity: Set(s.max_capacity as i32),
        open_hour: Set(s.open_hour.clone()),
        close_hour: Set(s.close_hour.clone()),
        duration_limit_minutes: Set(s.duration_limit_minutes as i32),
        current_occupied: Set(s.current_occupied as i32),
        updated_at: Set(Utc::now()),
    }
}

// ── SeaOrmSectorRepository ──────────────────────────────────────

pub struct SeaOrmSectorRepository {
    db: DatabaseConnection,
}

impl SeaOrmSectorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SectorRepository for SeaOrmSectorRepository {
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Sector>> {
        let model = sector::Entity::find_by_id(name.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Sector>> {
        let models = sector::Entity::find()
            .order_by_asc(sector::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }
}
