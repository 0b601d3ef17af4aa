//! Parallel point-of-interest selector: the one component of this crate
//! that fans work out across threads.
//!
//! For every `EphemSample` in a buffer, the samples whose sub-satellite
//! point falls inside a POI tile's rectangle are candidates for that
//! tile; among its candidates, the tile keeps the one with the smallest
//! great-circle range to the tile center, breaking ties by earliest
//! sample. Candidate generation (`SpatialGrid::query_all`, itself a
//! bounding-box-then-membership test) is split evenly across a small
//! worker pool and reduced back into one pick per tile.

use std::thread;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::dataset::poi::PoiTile;
use crate::ephemeris::{EphemBuffer, EphemSample};
use crate::error::{CoreError, Result};
use crate::geo::{bearing_deg, haversine_km, TileRect};
use crate::index::SpatialGrid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoiPick {
    pub name: String,
    pub poi_type: String,
    pub time_str: String,
    pub lat: f64,
    pub lon: f64,
    pub range_km: f64,
    pub bearing_deg: f64,
}

/// Lower bound on worker count regardless of what the platform reports,
/// and an upper bound so a huge host doesn't spawn a thread per sample.
const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 8;

fn worker_count(sample_count: usize) -> usize {
    let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(MIN_WORKERS);
    cores.clamp(MIN_WORKERS, MAX_WORKERS).min(sample_count.max(1))
}

struct Candidate {
    lat: f64,
    lon: f64,
    range_km: f64,
    bearing_deg: f64,
    jd: f64,
    time_str: String,
}

/// Select the closest sample per POI tile over the full buffer, fanning
/// candidate generation out across `std::thread::scope`d workers.
///
/// `filter_name`, when set, restricts the sweep to tiles with that exact
/// name (single-POI mode); `None` or empty selects every POI tile.
pub fn select(
    buffer: &EphemBuffer,
    tiles: &[PoiTile],
    filter_name: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Vec<PoiPick>> {
    if tiles.is_empty() || buffer.is_empty() {
        return Ok(Vec::new());
    }

    let rects: Vec<TileRect> = tiles.iter().map(|t| t.rect).collect();
    let grid = SpatialGrid::build(&rects);
    let centers: Vec<(f64, f64)> = tiles.iter().map(|t| t.rect.center()).collect();
    let allowed: Option<Vec<bool>> = match filter_name {
        Some(name) if !name.is_empty() => {
            Some(tiles.iter().map(|t| t.name == name).collect())
        }
        _ => None,
    };

    let workers = worker_count(buffer.samples.len());
    let chunk_len = buffer.samples.len().div_ceil(workers);

    let best_per_worker: Vec<Vec<Option<Candidate>>> = thread::scope(|scope| {
        let handles: Vec<_> = buffer
            .samples
            .chunks(chunk_len.max(1))
            .map(|chunk| {
                let grid = &grid;
                let rects = &rects;
                let centers = &centers;
                let allowed = allowed.as_deref();
                let cancel = cancel;
                scope.spawn(move || reduce_chunk(chunk, grid, rects, centers, allowed, cancel))
            })
            .collect();

        handles.into_iter().map(|h| h.join().expect("poi worker thread panicked")).collect()
    });

    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }

    let mut best: Vec<Option<Candidate>> = (0..tiles.len()).map(|_| None).collect();
    for worker_best in best_per_worker {
        for (idx, candidate) in worker_best.into_iter().enumerate() {
            merge_into(&mut best[idx], candidate);
        }
    }

    let picks = best
        .into_iter()
        .zip(tiles.iter())
        .filter_map(|(candidate, tile)| {
            candidate.map(|c| PoiPick {
                name: tile.name.clone(),
                poi_type: tile.poi_type.clone(),
                time_str: c.time_str,
                lat: c.lat,
                lon: c.lon,
                range_km: c.range_km,
                bearing_deg: c.bearing_deg,
            })
        })
        .collect();

    Ok(picks)
}

fn reduce_chunk(
    chunk: &[EphemSample],
    grid: &SpatialGrid,
    rects: &[TileRect],
    centers: &[(f64, f64)],
    allowed: Option<&[bool]>,
    cancel: &CancellationToken,
) -> Vec<Option<Candidate>> {
    let mut best: Vec<Option<Candidate>> = (0..rects.len()).map(|_| None).collect();
    for sample in chunk {
        if cancel.is_cancelled() {
            break;
        }
        for idx in grid.query_all(rects, sample.lat, sample.lon) {
            if let Some(allowed) = allowed {
                if !allowed[idx] {
                    continue;
                }
            }
            let (center_lat, center_lon) = centers[idx];
            let range_km = haversine_km(center_lat, center_lon, sample.lat, sample.lon);
            let bearing = bearing_deg(center_lat, center_lon, sample.lat, sample.lon);
            let candidate = Candidate {
                lat: sample.lat,
                lon: sample.lon,
                range_km,
                bearing_deg: bearing,
                jd: sample.jd,
                time_str: sample.time_str.clone(),
            };
            merge_into(&mut best[idx], Some(candidate));
        }
    }
    best
}

/// Keep the smaller-range candidate; on an exact tie keep the
/// earlier-in-time one.
fn merge_into(slot: &mut Option<Candidate>, incoming: Option<Candidate>) {
    let Some(incoming) = incoming else { return };
    match slot {
        None => *slot = Some(incoming),
        Some(current) => {
            let replace = incoming.range_km < current.range_km
                || (incoming.range_km == current.range_km && incoming.jd < current.jd);
            if replace {
                *slot = Some(incoming);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time_str: &str, jd: f64, lat: f64, lon: f64) -> EphemSample {
        EphemSample {
            jd,
            time_str: time_str.to_string(),
            lat,
            lon,
        }
    }

    fn tile(name: &str) -> PoiTile {
        PoiTile {
            rect: TileRect::new(48.0, 49.5, 1.5, 3.0),
            name: name.to_string(),
            poi_type: "city".to_string(),
            tile_km: None,
        }
    }

    #[test]
    fn test_picks_minimum_range_sample() {
        let buffer = EphemBuffer {
            samples: vec![
                sample("2026-01-01 00:00:00", 1.0, 48.9, 2.4),
                sample("2026-01-01 00:00:01", 1.0 + 1.0 / 86_400.0, 48.86, 2.3522),
                sample("2026-01-01 00:00:02", 1.0 + 2.0 / 86_400.0, 49.4, 2.9),
            ],
        };
        let tiles = vec![tile("Paris")];
        let cancel = CancellationToken::new();
        let picks = select(&buffer, &tiles, None, &cancel).unwrap();

        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].time_str, "2026-01-01 00:00:01");
        assert!(picks[0].range_km < 1.0);
    }

    #[test]
    fn test_tile_with_no_overflight_is_absent() {
        let buffer = EphemBuffer {
            samples: vec![sample("2026-01-01 00:00:00", 1.0, 0.0, 0.0)],
        };
        let tiles = vec![tile("Paris")];
        let cancel = CancellationToken::new();
        let picks = select(&buffer, &tiles, None, &cancel).unwrap();
        assert!(picks.is_empty());
    }

    #[test]
    fn test_tie_break_prefers_earlier_sample() {
        let buffer = EphemBuffer {
            samples: vec![
                sample("2026-01-01 00:00:00", 1.0, 48.86, 2.3522),
                sample("2026-01-01 00:00:01", 1.0 + 1.0 / 86_400.0, 48.86, 2.3522),
            ],
        };
        let tiles = vec![tile("Paris")];
        let cancel = CancellationToken::new();
        let picks = select(&buffer, &tiles, None, &cancel).unwrap();
        assert_eq!(picks[0].time_str, "2026-01-01 00:00:00");
    }

    #[test]
    fn test_empty_buffer_yields_no_picks() {
        let buffer = EphemBuffer::default();
        let tiles = vec![tile("Paris")];
        let cancel = CancellationToken::new();
        let picks = select(&buffer, &tiles, None, &cancel).unwrap();
        assert!(picks.is_empty());
    }

    #[test]
    fn test_name_filter_excludes_other_tiles() {
        let buffer = EphemBuffer {
            samples: vec![sample("2026-01-01 00:00:00", 1.0, 48.86, 2.3522)],
        };
        let mut other = tile("Versailles");
        other.rect = TileRect::new(48.0, 49.5, 1.5, 3.0);
        let tiles = vec![tile("Paris"), other];
        let cancel = CancellationToken::new();

        let picks = select(&buffer, &tiles, Some("Versailles"), &cancel).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].name, "Versailles");
    }
}
