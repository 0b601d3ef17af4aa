//! Narrow facade over the vendored SGP4 propagator.
//!
//! Mirrors `orbital-mechanics::propagation`: build `sgp4::Constants` once
//! from a TLE pair, then advance by minutes-since-epoch. The public surface
//! is the single `advance(state, jd)` pure function called for by the spec;
//! `SatState` is cloned per run so worker threads never share propagator
//! state.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{CoreError, Result};
use crate::time;

/// Julian date of the Unix epoch, used to convert between `chrono`
/// `NaiveDateTime` and Julian date.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;

fn naive_to_jd(dt: NaiveDateTime) -> f64 {
    JD_UNIX_EPOCH + dt.and_utc().timestamp() as f64 / 86_400.0
}

fn jd_to_naive(jd: f64) -> Result<NaiveDateTime> {
    let cal = time::jd_to_utc(jd);
    NaiveDate::from_ymd_opt(cal.year, cal.month, cal.day)
        .and_then(|d| d.and_hms_opt(cal.hour, cal.minute, cal.second))
        .ok_or_else(|| CoreError::TimeParseError(format!("invalid calendar derived from jd {jd}")))
}

/// Greenwich Mean Sidereal Time, in degrees, for a given Julian date (UTC).
fn gmst_degrees(jd: f64) -> f64 {
    let d = jd - 2_451_545.0;
    let t = d / 36_525.0;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    gmst.rem_euclid(360.0)
}

/// Opaque orbital state consumed by the propagator adapter. Mutated only
/// by `advance`'s internal propagation call, never by callers.
#[derive(Debug, Clone)]
pub struct SatState {
    elements: sgp4::Elements,
    constants: std::sync::Arc<sgp4::Constants>,
    epoch_jd: f64,
}

impl SatState {
    pub fn from_tle(line1: &str, line2: &str) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| CoreError::PropagationError(format!("invalid TLE: {e:?}")))?;
        Self::from_elements(elements)
    }

    fn from_elements(elements: sgp4::Elements) -> Result<Self> {
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| CoreError::PropagationError(format!("{e:?}")))?;
        let epoch_jd = naive_to_jd(elements.datetime);
        Ok(Self {
            elements,
            constants: std::sync::Arc::new(constants),
            epoch_jd,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }
}

/// Advance `state` to `jd` (Julian date, UTC) and return the sub-satellite
/// latitude/longitude in degrees.
pub fn advance(state: &SatState, jd: f64) -> Result<(f64, f64)> {
    let target = jd_to_naive(jd)?;
    let minutes = state
        .elements
        .datetime_to_minutes_since_epoch(&target)
        .map_err(|e| CoreError::PropagationError(format!("{e:?}")))?;

    let prediction = state
        .constants
        .propagate(minutes)
        .map_err(|e| CoreError::PropagationError(format!("{e:?}")))?;

    let [x, y, z] = prediction.position;
    Ok(eci_to_geodetic(x, y, z, jd))
}

/// ECI (km) to geodetic sub-satellite point, correcting for Earth rotation
/// via GMST. Latitude is geocentric (the small geocentric/geodetic
/// difference, up to ~0.19 deg, is within the tile-membership tolerance
/// used by the territory/POI spatial index).
fn eci_to_geodetic(x: f64, y: f64, z: f64, jd: f64) -> (f64, f64) {
    let r_xy = (x * x + y * y).sqrt();
    let lat = z.atan2(r_xy).to_degrees();

    let lon_eci = y.atan2(x).to_degrees();
    let lon = crate::geo::norm_lon(lon_eci - gmst_degrees(jd));

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A known-good ISS-like TLE pair, used only to exercise the
    // parse -> propagate -> geodetic pipeline.
    const LINE1: &str = "1 25544U 98067A   24010.50000000  .00016717  00000-0  10270-3 0  9007";
    const LINE2: &str = "2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.49560190 21025";

    #[test]
    fn test_from_tle_and_advance() {
        let state = SatState::from_tle(LINE1, LINE2).unwrap();
        let (lat, lon) = advance(&state, state.epoch_jd).unwrap();
        assert!((-90.0..=90.0).contains(&lat));
        assert!((-180.0..180.0).contains(&lon));
    }

    #[test]
    fn test_advance_is_deterministic_per_clone() {
        let state = SatState::from_tle(LINE1, LINE2).unwrap();
        let clone = state.clone();
        let a = advance(&state, state.epoch_jd + 0.01).unwrap();
        let b = advance(&clone, state.epoch_jd + 0.01).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gmst_in_range() {
        let g = gmst_degrees(2_460_832.436);
        assert!((0.0..360.0).contains(&g));
    }
}
