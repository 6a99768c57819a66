use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Axis-aligned rectangle on raw coordinates.
///
/// Boxes crossing the antimeridian are not supported: a box whose
/// `bottom_left.longitude` is greater than `top_right.longitude` simply
/// matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub bottom_left: Point,
    pub top_right: Point,
}

impl BoundingBox {
    pub fn new(bottom_left: Point, top_right: Point) -> Self {
        Self {
            bottom_left,
            top_right,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bottom_left.validate()?;
        self.top_right.validate()?;
        if self.bottom_left.latitude > self.top_right.latitude {
            return Err(Error::InvalidInput(format!(
                "bounding box bottom-left latitude {} is above top-right latitude {}",
                self.bottom_left.latitude, self.top_right.latitude
            )));
        }
        Ok(())
    }

    /// Strict containment test on raw coordinates.
    pub fn strictly_contains(&self, point: &Point) -> bool {
        point.latitude > self.bottom_left.latitude
            && point.latitude < self.top_right.latitude
            && point.longitude > self.bottom_left.longitude
            && point.longitude < self.top_right.longitude
    }

    /// Inclusive containment test on raw coordinates.
    pub fn contains(&self, point: &Point) -> bool {
        (self.bottom_left.latitude..=self.top_right.latitude).contains(&point.latitude)
            && (self.bottom_left.longitude..=self.top_right.longitude).contains(&point.longitude)
    }
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InvalidInput(format!(
                "{} range has min {} greater than max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Attribute filter shared by listing search and statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub n_rooms: IntRange,
    pub surface: IntRange,
    pub condition: String,
}

impl PropertyFilter {
    pub fn validate(&self) -> Result<()> {
        self.n_rooms.validate("nRooms")?;
        self.surface.validate("surface")?;
        Ok(())
    }
}
