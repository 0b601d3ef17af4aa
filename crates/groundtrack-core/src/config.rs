//! Run-scoped configuration handle.
//!
//! Earlier revisions of this pipeline threaded satellite elements,
//! dataset paths and step/horizon settings through module-level
//! singletons. `RunConfig` replaces that: it is built once per run and
//! passed by reference to every component, so two runs (or two threads)
//! never contend over shared state.

use std::path::PathBuf;

use crate::labeler::TerritorySelector;

/// A named site whose overflight geometry (range, bearing) can be tracked
/// alongside the bulk POI sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverSite {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
}

impl Default for ObserverSite {
    fn default() -> Self {
        Self {
            name: "origin".to_string(),
            lat: 0.0,
            lon: 0.0,
            altitude_m: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tle_line1: String,
    pub tle_line2: String,
    pub step_s: f64,
    pub horizon_s: f64,
    pub territory_dataset_path: Option<PathBuf>,
    pub territory_selector: TerritorySelector,
    pub poi_dataset_path: Option<PathBuf>,
    /// Carried per spec.md's engine input list even though the
    /// propagation math never reads it (see `ephemeris::EphemerisEngine::run`).
    pub observer: ObserverSite,
}

impl RunConfig {
    pub fn new(tle_line1: impl Into<String>, tle_line2: impl Into<String>) -> Self {
        Self {
            tle_line1: tle_line1.into(),
            tle_line2: tle_line2.into(),
            step_s: 1.0,
            horizon_s: 3600.0,
            territory_dataset_path: None,
            territory_selector: TerritorySelector::All,
            poi_dataset_path: None,
            observer: ObserverSite::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_one_hz_one_hour() {
        let cfg = RunConfig::new("l1", "l2");
        assert_eq!(cfg.step_s, 1.0);
        assert_eq!(cfg.horizon_s, 3600.0);
        assert_eq!(cfg.territory_selector, TerritorySelector::All);
        assert_eq!(cfg.observer, ObserverSite::default());
    }

    #[test]
    fn test_observer_site_default_is_origin() {
        let site = ObserverSite::default();
        assert_eq!(site.name, "origin");
        assert_eq!(site.lat, 0.0);
        assert_eq!(site.lon, 0.0);
        assert_eq!(site.altitude_m, 0.0);
    }
}
