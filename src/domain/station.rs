// Station domain model
use super::coordinate::Coordinate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationId(pub i64);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub coordinates: Coordinate,
}

impl Station {
    pub fn new(id: StationId, name: String, coordinates: Coordinate) -> Self {
        Self {
            id,
            name,
            coordinates,
        }
    }
}
