//! Vehicle entry entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum VehicleStatus {
    #[sea_orm(string_value = "ENTRY")]
    Entry,
    #[sea_orm(string_value = "PARKED")]
    Parked,
    #[sea_orm(string_value = "EXIT")]
    Exit,
}

/// One visit of a vehicle; closed visits are kept as history
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle_entries")]
pub struct Model {
    /// Visit id (UUID text)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub license_plate: String,

    pub status: VehicleStatus,

    pub entry_time: DateTime<Utc>,

    pub parked_time: Option<DateTime<Utc>>,

    pub exit_time: Option<DateTime<Utc>>,

    /// Set only while PARKED
    pub spot_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
