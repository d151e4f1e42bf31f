//! Spot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Physical parking spot
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spots")]
pub struct Model {
    /// External id from the feed
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub lat: f64,

    pub lng: f64,

    pub occupied: bool,

    /// Owning sector (by name)
    pub sector_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
