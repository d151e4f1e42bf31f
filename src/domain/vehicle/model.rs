//! Vehicle entry domain entity

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::spot::SpotId;

pub const SYNTHETIC_PLATE_PREFIX: &str = "SIMULATED-SPOT-";

/// Plate used for vehicles only known through the occupancy feed
pub fn synthetic_plate(spot_id: SpotId) -> String {
    format!("{}{}", SYNTHETIC_PLATE_PREFIX, spot_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Entry,
    Parked,
    Exit,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "ENTRY",
            Self::Parked => "PARKED",
            Self::Exit => "EXIT",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENTRY" => Ok(Self::Entry),
            "PARKED" => Ok(Self::Parked),
            "EXIT" => Ok(Self::Exit),
            other => Err(format!("unknown vehicle status: {}", other)),
        }
    }
}

/// One visit of a vehicle.
///
/// `assigned_spot` is set iff `status == Parked`.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleEntry {
    pub id: Uuid,
    pub license_plate: String,
    pub entry_time: DateTime<Utc>,
    pub parked_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub assigned_spot: Option<SpotId>,
    pub status: VehicleStatus,
}

impl VehicleEntry {
    pub fn new(license_plate: impl Into<String>, entry_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            license_plate: license_plate.into(),
            entry_time,
            parked_time: None,
            exit_time: None,
            assigned_spot: None,
            status: VehicleStatus::Entry,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != VehicleStatus::Exit
    }

    pub fn is_parked(&self) -> bool {
        self.status == VehicleStatus::Parked
    }

    pub fn park(&mut self, spot_id: SpotId, at: DateTime<Utc>) {
        self.parked_time = Some(at);
        self.assigned_spot = Some(spot_id);
        self.status = VehicleStatus::Parked;
    }

    /// Terminal transition; releases the spot reference.
    pub fn close(&mut self, at: DateTime<Utc>) {
        self.exit_time = Some(at);
        self.assigned_spot = None;
        self.status = VehicleStatus::Exit;
    }

    /// Start of the billable period
    pub fn billable_since(&self) -> DateTime<Utc> {
        self.parked_time.unwrap_or(self.entry_time)
    }
}
