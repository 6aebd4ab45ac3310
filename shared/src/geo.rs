use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub const DEFAULT_LATITUDE: f64 = 40.7128;
pub const DEFAULT_LONGITUDE: f64 = -74.006;
pub const DEFAULT_ZOOM: u8 = 13;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 19;

// Web Mercator cuts off at this latitude.
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

const WORLD_IMAGERY_TILE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile";

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    NotANumber,
    LatitudeOutOfRange,
    LongitudeOutOfRange,
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateError::NotANumber => write!(f, "Please enter valid numbers"),
            CoordinateError::LatitudeOutOfRange => {
                write!(f, "Latitude must be between -90 and 90")
            }
            CoordinateError::LongitudeOutOfRange => {
                write!(f, "Longitude must be between -180 and 180")
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LATITUDE,
            lng: DEFAULT_LONGITUDE,
        }
    }
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NotANumber);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange);
        }
        Ok(Self { lat, lng })
    }

    /// Parses the two text fields of the coordinate form.
    pub fn parse(lat: &str, lng: &str) -> Result<Self, CoordinateError> {
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordinateError::NotANumber)?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordinateError::NotANumber)?;
        Self::new(lat, lng)
    }

    pub fn label(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }

    /// File name offered when the tile under these coordinates is downloaded.
    pub fn download_file_name(&self) -> String {
        format!("satellite-{:.4}-{:.4}.png", self.lat, self.lng)
    }
}

/// A slippy-map tile address.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn clamp_zoom(zoom: u8) -> u8 {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }

    /// The tile containing `coords` at `zoom`.
    pub fn containing(coords: &Coordinates, zoom: u8) -> Self {
        let z = Self::clamp_zoom(zoom);
        let n = f64::from(1u32 << z);
        let max_index = (1u32 << z) - 1;

        let lat = coords
            .lat
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();
        let x = ((coords.lng + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();

        Self {
            x: (x.max(0.0) as u32).min(max_index),
            y: (y.max(0.0) as u32).min(max_index),
            z,
        }
    }

    pub fn world_imagery_url(&self) -> String {
        format!("{}/{}/{}/{}", WORLD_IMAGERY_TILE_URL, self.z, self.y, self.x)
    }
}
