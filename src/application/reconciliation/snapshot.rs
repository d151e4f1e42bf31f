//! Garage feed snapshot types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::pricing;
use crate::domain::{DomainResult, SectorConfig, SpotId};
use crate::shared::errors::InfraError;

/// `GET /garage` response of the occupancy feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarageSnapshot {
    #[serde(default)]
    pub garage: Vec<SectorSnapshot>,
    #[serde(default)]
    pub spots: Vec<SpotSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub sector: String,
    #[serde(rename = "basePrice", alias = "base_price")]
    pub base_price: f64,
    pub max_capacity: u32,
    #[serde(default)]
    pub open_hour: String,
    #[serde(default)]
    pub close_hour: String,
    #[serde(default)]
    pub duration_limit_minutes: u32,
}

impl SectorSnapshot {
    pub fn to_config(&self) -> DomainResult<SectorConfig> {
        Ok(SectorConfig {
            name: self.sector.trim().to_string(),
            base_price: pricing::decimal_from_f64(self.base_price, "basePrice")?,
            max_capacity: self.max_capacity,
            open_hour: self.open_hour.clone(),
            close_hour: self.close_hour.clone(),
            duration_limit_minutes: self.duration_limit_minutes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotSnapshot {
    pub id: Option<SpotId>,
    pub sector: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub occupied: bool,
}

/// Where snapshots come from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<GarageSnapshot, InfraError>;
}
