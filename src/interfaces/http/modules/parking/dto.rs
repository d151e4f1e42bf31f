//! Status query DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{GarageView, PlateStatus, RevenueSummary, SpotStatus};
use crate::domain::pricing::to_f64;
use crate::domain::{Sector, Spot, SpotId};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlateStatusRequest {
    #[validate(length(min = 1, max = 32, message = "license_plate is required"))]
    pub license_plate: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlateStatusResponse {
    pub license_plate: String,
    /// `ENTRY`, `PARKED` or `EXIT`
    pub status: String,
    /// Running price while parked, otherwise 0
    pub price_until_now: f64,
    pub entry_time: DateTime<Utc>,
    pub time_parked: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub spot_id: Option<SpotId>,
    pub sector: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<PlateStatus> for PlateStatusResponse {
    fn from(p: PlateStatus) -> Self {
        Self {
            license_plate: p.license_plate,
            status: p.status.to_string(),
            price_until_now: to_f64(p.price_until_now),
            entry_time: p.entry_time,
            time_parked: p.parked_time,
            exit_time: p.exit_time,
            spot_id: p.spot_id,
            sector: p.sector,
            lat: p.lat,
            lng: p.lng,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SpotStatusRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "lat must be within [-90, 90]"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "lng must be within [-180, 180]"))]
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotStatusResponse {
    pub spot_id: SpotId,
    pub sector: String,
    pub occupied: bool,
    pub license_plate: Option<String>,
    pub price_until_now: f64,
    pub entry_time: Option<DateTime<Utc>>,
    pub time_parked: Option<DateTime<Utc>>,
}

impl From<SpotStatus> for SpotStatusResponse {
    fn from(s: SpotStatus) -> Self {
        Self {
            spot_id: s.spot_id,
            sector: s.sector,
            occupied: s.occupied,
            license_plate: s.license_plate,
            price_until_now: to_f64(s.price_until_now),
            entry_time: s.entry_time,
            time_parked: s.parked_time,
        }
    }
}

/// Used both as query string (`GET`) and body (`POST`)
#[derive(Debug, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevenueRequest {
    /// Day in `YYYY-MM-DD`
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 64, message = "sector is required"))]
    pub sector: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevenueResponse {
    pub amount: f64,
    pub currency: String,
    /// Start of the requested day, UTC
    pub timestamp: DateTime<Utc>,
}

impl From<RevenueSummary> for RevenueResponse {
    fn from(r: RevenueSummary) -> Self {
        Self {
            amount: to_f64(r.amount),
            currency: r.currency,
            timestamp: r.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SectorDto {
    pub sector: String,
    #[serde(rename = "basePrice")]
    pub base_price: f64,
    pub max_capacity: u32,
    pub current_occupied: u32,
    pub open_hour: String,
    pub close_hour: String,
    pub duration_limit_minutes: u32,
}

impl From<Sector> for SectorDto {
    fn from(s: Sector) -> Self {
        Self {
            sector: s.name,
            base_price: to_f64(s.base_price),
            max_capacity: s.max_capacity,
            current_occupied: s.current_occupied,
            open_hour: s.open_hour,
            close_hour: s.close_hour,
            duration_limit_minutes: s.duration_limit_minutes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotDto {
    pub id: SpotId,
    pub sector: String,
    pub lat: f64,
    pub lng: f64,
    pub occupied: bool,
}

impl From<Spot> for SpotDto {
    fn from(s: Spot) -> Self {
        Self {
            id: s.id,
            sector: s.sector,
            lat: s.lat,
            lng: s.lng,
            occupied: s.occupied,
        }
    }
}

/// Same shape as the simulator's garage feed, plus live occupancy
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GarageResponse {
    pub garage: Vec<SectorDto>,
    pub spots: Vec<SpotDto>,
    pub available_spots: u32,
}

impl From<GarageView> for GarageResponse {
    fn from(g: GarageView) -> Self {
        Self {
            garage: g.sectors.into_iter().map(Into::into).collect(),
            spots: g.spots.into_iter().map(Into::into).collect(),
            available_spots: g.available_spots,
        }
    }
}
