//! Geo primitives: longitude normalization, axis-aligned rectangles with
//! dateline wrap, great-circle distance and forward azimuth.

use serde::{Deserialize, Serialize};

/// Tolerance used by latitude interval membership tests.
const LAT_EPS: f64 = 1e-12;

/// Earth radius used throughout the pipeline, matching the haversine
/// constant used for ground-station distance scoring.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Normalize a longitude in degrees to `[-180, 180)`.
pub fn norm_lon(x: f64) -> f64 {
    let mut v = x % 360.0;
    if v < -180.0 {
        v += 360.0;
    } else if v >= 180.0 {
        v -= 360.0;
    }
    v
}

/// Axis-aligned lat/lon rectangle. `lon_min`/`lon_max` are stored normalized
/// to `[-180, 180)`; if `lon_min > lon_max` the rectangle wraps the
/// antimeridian.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TileRect {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl TileRect {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min: lat_min.min(lat_max),
            lat_max: lat_min.max(lat_max),
            lon_min: norm_lon(lon_min),
            lon_max: norm_lon(lon_max),
        }
    }

    pub fn wraps_antimeridian(&self) -> bool {
        self.lon_min > self.lon_max
    }

    pub fn center(&self) -> (f64, f64) {
        let lat_c = (self.lat_min + self.lat_max) / 2.0;
        let lon_c = if self.wraps_antimeridian() {
            let span = (180.0 - self.lon_min) + (self.lon_max + 180.0);
            norm_lon(self.lon_min + span / 2.0)
        } else {
            (self.lon_min + self.lon_max) / 2.0
        };
        (lat_c, lon_c)
    }
}

/// Rectangle membership test, inclusive on latitude within `LAT_EPS`,
/// dateline-aware on longitude.
pub fn contains(rect: &TileRect, lat: f64, lon: f64) -> bool {
    if lat < rect.lat_min - LAT_EPS || lat > rect.lat_max + LAT_EPS {
        return false;
    }
    let lon = norm_lon(lon);
    if rect.wraps_antimeridian() {
        lon >= rect.lon_min || lon <= rect.lon_max
    } else {
        lon >= rect.lon_min && lon <= rect.lon_max
    }
}

/// Haversine great-circle distance in km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Forward azimuth from (lat1, lon1) to (lat2, lon2), normalized to `[0, 360)`.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();

    (theta + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_lon_wraps() {
        assert!((norm_lon(180.0) - (-180.0)).abs() < 1e-9);
        assert!((norm_lon(-181.0) - 179.0).abs() < 1e-9);
        assert!((norm_lon(540.0) - 180.0).abs() < 1e-9 || (norm_lon(540.0) + 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_dateline_rectangle_contains() {
        let r = TileRect::new(-5.0, 5.0, 170.0, -170.0);
        assert!(r.wraps_antimeridian());
        assert!(contains(&r, 0.0, 175.0));
        assert!(contains(&r, 0.0, -175.0));
        assert!(!contains(&r, 0.0, 0.0));
    }

    #[test]
    fn test_wrap_symmetry() {
        let r = TileRect::new(-5.0, 5.0, 170.0, -170.0);
        for lon in [-175.0, 175.0, -170.0, 170.0] {
            assert_eq!(contains(&r, 1.0, lon), contains(&r, 1.0, lon + 360.0));
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // NYC to London: ~5,570 km
        let dist = haversine_km(40.7128, -74.006, 51.5074, -0.1278);
        assert!((dist - 5570.0).abs() < 50.0);
    }

    #[test]
    fn test_bearing_in_range() {
        let b = bearing_deg(48.8566, 2.3522, 48.86, 2.36);
        assert!((0.0..360.0).contains(&b));
    }
}
