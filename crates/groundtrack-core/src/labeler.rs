//! Per-sample country-of-overflight resolution over an `EphemBuffer`.

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::dataset::territory::TerritoryDataset;
use crate::ephemeris::EphemBuffer;
use crate::error::{CoreError, Result};
use crate::geo::TileRect;
use crate::index::SpatialGrid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerritoryRow {
    pub time_str: String,
    pub lat: f64,
    pub lon: f64,
    pub country_label: String,
}

/// Either every overflown country ("all land") or one specific label.
#[derive(Debug, Clone, PartialEq)]
pub enum TerritorySelector {
    All,
    Country(String),
}

/// If consecutive emitted rows are more than this many seconds apart, a
/// gap marker may be inserted for on-screen display (never in the export).
const GAP_MARKER_THRESHOLD_S: i64 = 30;

/// Label every sample in `buffer` against `dataset`, preserving input
/// order. Non-land samples (no rectangle hit) are dropped; a sample is
/// emitted when the selector is `All` or matches the hit's label exactly.
pub fn label(
    buffer: &EphemBuffer,
    dataset: &TerritoryDataset,
    selector: &TerritorySelector,
    cancel: &CancellationToken,
) -> Result<Vec<TerritoryRow>> {
    let rects: Vec<TileRect> = dataset.rects();
    let grid = SpatialGrid::build(&rects);

    let mut rows = Vec::new();
    for sample in &buffer.samples {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let Some(hit) = grid.query_first(&rects, sample.lat, sample.lon) else {
            continue;
        };
        let label = &dataset.tiles[hit].label;

        let emit = match selector {
            TerritorySelector::All => true,
            TerritorySelector::Country(name) => label == name,
        };
        if emit {
            rows.push(TerritoryRow {
                time_str: sample.time_str.clone(),
                lat: sample.lat,
                lon: sample.lon,
                country_label: label.clone(),
            });
        }
    }

    Ok(rows)
}

/// Insert a single blank separator row wherever two consecutive rows are
/// more than `GAP_MARKER_THRESHOLD_S` seconds apart (by Unix-seconds
/// derived from each row's `time_str`). Display-only: callers bound for
/// CSV export must not call this.
pub fn insert_gap_markers(rows: &[TerritoryRow]) -> Vec<TerritoryRow> {
    let mut out = Vec::with_capacity(rows.len());
    for window in rows.windows(2) {
        out.push(window[0].clone());
        if let (Ok(a), Ok(b)) = (
            crate::time::parse_display_time(&crate::time::normalize_separators(&window[0].time_str)),
            crate::time::parse_display_time(&crate::time::normalize_separators(&window[1].time_str)),
        ) {
            if (b - a).abs() > GAP_MARKER_THRESHOLD_S {
                out.push(TerritoryRow {
                    time_str: String::new(),
                    lat: 0.0,
                    lon: 0.0,
                    country_label: String::new(),
                });
            }
        }
    }
    if let Some(last) = rows.last() {
        out.push(last.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::EphemSample;

    fn dataset() -> TerritoryDataset {
        TerritoryDataset {
            tiles: vec![
                crate::dataset::territory::CountryTile {
                    rect: TileRect::new(49.9, 60.9, -8.6, 1.8),
                    label: "United Kingdom".to_string(),
                },
                crate::dataset::territory::CountryTile {
                    rect: TileRect::new(41.3, 51.1, -5.1, 9.6),
                    label: "France".to_string(),
                },
            ],
        }
    }

    fn sample(time_str: &str, lat: f64, lon: f64) -> EphemSample {
        EphemSample {
            jd: 0.0,
            time_str: time_str.to_string(),
            lat,
            lon,
        }
    }

    #[test]
    fn test_wildcard_labels_uk() {
        let buffer = EphemBuffer {
            samples: vec![sample("2026-01-01 00:00:00", 51.5074, -0.1278)],
        };
        let cancel = CancellationToken::new();
        let rows = label(&buffer, &dataset(), &TerritorySelector::All, &cancel).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_label, "United Kingdom");
    }

    #[test]
    fn test_non_land_sample_dropped() {
        let buffer = EphemBuffer {
            samples: vec![sample("2026-01-01 00:00:00", 0.0, 0.0)],
        };
        let cancel = CancellationToken::new();
        let rows = label(&buffer, &dataset(), &TerritorySelector::All, &cancel).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_specific_country_filter() {
        let buffer = EphemBuffer {
            samples: vec![
                sample("2026-01-01 00:00:00", 51.5074, -0.1278),
                sample("2026-01-01 00:00:01", 45.0, 2.0),
            ],
        };
        let cancel = CancellationToken::new();
        let rows = label(
            &buffer,
            &dataset(),
            &TerritorySelector::Country("France".to_string()),
            &cancel,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_label, "France");
    }

    #[test]
    fn test_gap_marker_inserted_once() {
        let rows = vec![
            TerritoryRow {
                time_str: "2026-01-01 00:00:00".to_string(),
                lat: 51.0,
                lon: 0.0,
                country_label: "United Kingdom".to_string(),
            },
            TerritoryRow {
                time_str: "2026-01-01 00:00:40".to_string(),
                lat: 45.0,
                lon: 2.0,
                country_label: "France".to_string(),
            },
        ];
        let with_gaps = insert_gap_markers(&rows);
        assert_eq!(with_gaps.len(), 3);
        assert!(with_gaps[1].time_str.is_empty());
    }
}
