//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in EPSG:4326 (degrees).
///
/// Ordinate ordering follows the map client: `[minLon, minLat, maxLon, maxLat]`.
/// Values are not range-checked here; the remote imagery service rejects
/// malformed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Build from the request's 4-element array form.
    pub fn from_array(values: &[f64]) -> Result<Self, BboxParseError> {
        match values {
            [min_lon, min_lat, max_lon, max_lat] => {
                Ok(Self::new(*min_lon, *min_lat, *max_lon, *max_lat))
            }
            _ => Err(BboxParseError::WrongLength(values.len())),
        }
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("bounds must contain exactly 4 values, got {0}")]
    WrongLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_array() {
        let bbox = BoundingBox::from_array(&[30.0, 45.0, 32.5, 47.0]).unwrap();
        assert_eq!(bbox.min_lon, 30.0);
        assert_eq!(bbox.min_lat, 45.0);
        assert_eq!(bbox.max_lon, 32.5);
        assert_eq!(bbox.max_lat, 47.0);
        assert_eq!(bbox.width(), 2.5);
        assert_eq!(bbox.height(), 2.0);
    }

    #[test]
    fn test_from_array_wrong_length() {
        let err = BoundingBox::from_array(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, BboxParseError::WrongLength(3)));
    }
}
