//! Daily revenue entity

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Revenue accumulated per (date, sector)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "revenues")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub date: NaiveDate,

    pub sector_name: String,

    /// Total in cents
    pub amount_cents: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
