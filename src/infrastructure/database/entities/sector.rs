//! Sector entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sector model - tariff, capacity and live occupancy of a garage zone
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sectors")]
pub struct Model {
    /// Sector name as reported by the feed (e.g. "A")
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    /// Hourly price in cents
    pub base_price_cents: i64,

    pub max_capacity: i32,

    pub open_hour: String,

    pub close_hour: String,

    pub duration_limit_minutes: i32,

    /// Vehicles currently parked in the sector
    pub current_occupied: i32,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
