//! SeaORM implementation of SpotRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::db_err;
use crate::domain::spot::{Spot, SpotId, SpotRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::spot;

pub(super) fn entity_to_domain(s: spot::Model) -> Spot {
    Spot {
        id: s.id,
        lat: s.lat,
        lng: s.lng,
        occupied: s.occupied,
        sector: s.sector_name,
    }
}

pub(super) fn domain_to_active(s: &Spot) -> spot::ActiveModel {
    spot::ActiveModel {
        id: Set(s.id),
        lat: Set(s.lat),
        lng: Set(s.lng),
        occupied: Set(s.occupied),
        sector_name: Set(s.sector.clone()),
    }
}

pub struct SeaOrmSpotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSpotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SpotRepository for SeaOrmSpotRepository {
    async fn find_by_id(&self, id: SpotId) -> DomainResult<Option<Spot>> {
        let model = spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_by_coordinates(&self, lat: f64, lng: f64) -> DomainResult<Option<Spot>> {
        let model = spot::Entity::find()
            .filter(spot::Column::Lat.eq(lat))
            .filter(spot::Column::Lng.eq(lng))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Spot>> {
        let models = spot::Entity::find()
            .order_by_asc(spot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }
}
