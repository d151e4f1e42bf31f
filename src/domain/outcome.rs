//! Operation outcomes
//!
//! Lifecycle operations distinguish "applied" from "skipped because a
//! precondition did not hold". Skips are not errors: they are invisible on
//! the wire but observable by callers and tests.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    BlankPlate,
    DuplicateEntry,
    VehicleNotFound,
    AlreadyParked,
    SpotNotFound,
    SectorNotFound,
    SectorFull,
    SpotOccupied,
    /// The vehicle is parked on a different spot than the caller expected
    SpotMismatch,
    CoordinatesTaken,
    Unchanged,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlankPlate => "blank_plate",
            Self::DuplicateEntry => "duplicate_entry",
            Self::VehicleNotFound => "vehicle_not_found",
            Self::AlreadyParked => "already_parked",
            Self::SpotNotFound => "spot_not_found",
            Self::SectorNotFound => "sector_not_found",
            Self::SectorFull => "sector_full",
            Self::SpotOccupied => "spot_occupied",
            Self::SpotMismatch => "spot_mismatch",
            Self::CoordinatesTaken => "coordinates_taken",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T = ()> {
    Applied(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            Self::Applied(_) => None,
        }
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    /// Metric label: `applied` or the skip reason
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied(_) => "applied",
            Self::Skipped(reason) => reason.as_str(),
        }
    }
}
