//! Spot domain entity

/// External numeric identifier of a physical spot
pub type SpotId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub id: SpotId,
    pub lat: f64,
    pub lng: f64,
    pub occupied: bool,
    /// Name of the owning sector
    pub sector: String,
}

impl Spot {
    pub fn new(id: SpotId, sector: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id,
            lat,
            lng,
            occupied: false,
            sector: sector.into(),
        }
    }

    pub fn is_at(&self, lat: f64, lng: f64) -> bool {
        self.lat == lat && self.lng == lng
    }
}
