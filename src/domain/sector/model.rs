//! Sector domain entity

use rust_decimal::Decimal;

/// Tariff and capacity of a sector as reported by the garage feed
#[derive(Debug, Clone, PartialEq)]
pub struct SectorConfig {
    pub name: String,
    /// Currency units per hour
    pub base_price: Decimal,
    pub max_capacity: u32,
    pub open_hour: String,
    pub close_hour: String,
    pub duration_limit_minutes: u32,
}

/// Sector with its live occupancy counter.
///
/// `current_occupied` never exceeds `max_capacity` and never goes below zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub name: String,
    pub base_price: Decimal,
    pub max_capacity: u32,
    pub open_hour: String,
    pub close_hour: String,
    pub duration_limit_minutes: u32,
    pub current_occupied: u32,
}

impl Sector {
    pub fn new(config: SectorConfig) -> Self {
        Self {
            name: config.name,
            base_price: config.base_price,
            max_capacity: config.max_capacity,
            open_hour: config.open_hour,
            close_hour: config.close_hour,
            duration_limit_minutes: config.duration_limit_minutes,
            current_occupied: 0,
        }
    }

    /// `current_occupied / max_capacity`; a zero-capacity sector counts as full.
    pub fn occupancy_ratio(&self) -> Decimal {
        if self.max_capacity == 0 {
            return Decimal::ONE;
        }
        Decimal::from(self.current_occupied) / Decimal::from(self.max_capacity)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_occupied < self.max_capacity
    }

    pub fn available(&self) -> u32 {
        self.max_capacity.saturating_sub(self.current_occupied)
    }

    /// Capacity-checked increment. Returns false when the sector is full.
    pub fn try_occupy(&mut self) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.current_occupied += 1;
        true
    }

    /// Clamped decrement
    pub fn release(&mut self) {
        self.current_occupied = self.current_occupied.saturating_sub(1);
    }

    /// Apply reported configuration, keeping the occupancy counter.
    ///
    /// A reported capacity below the current occupancy is raised to the
    /// occupancy so the counter invariant holds. Returns whether anything changed.
    pub fn apply_config(&mut self, config: &SectorConfig) -> bool {
        let max_capacity = config.max_capacity.max(self.current_occupied);
        let changed = self.base_price != config.base_price
            || self.max_capacity != max_capacity
            || self.open_hour != config.open_hour
            || self.close_hour != config.close_hour
            || self.duration_limit_minutes != config.duration_limit_minutes;

        if changed {
            self.base_price = config.base_price;
            self.max_capacity = max_capacity;
            self.open_hour = config.open_hour.clone();
            self.close_hour = config.close_hour.clone();
            self.duration_limit_minutes = config.duration_limit_minutes;
        }
        changed
    }
}
