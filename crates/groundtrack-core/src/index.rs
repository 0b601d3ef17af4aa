//! 1 degree x 1 degree equirectangular spatial index over tile rectangles.
//!
//! Buckets store indices into the caller's rectangle slice rather than
//! owning copies, matching the redesign note in spec section 9: the index
//! is a run-scoped handle, never a global singleton.

use std::collections::HashMap;

use crate::geo::{contains, norm_lon, TileRect};

const CELL_DEG: f64 = 1.0;
const ROW_MAX: i64 = 179;
const COL_MAX: i64 = 359;
/// Small offset used to keep the two wrap-split spans non-overlapping at
/// the antimeridian seam.
const WRAP_DELTA: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row: i64,
    pub col: i64,
}

fn row_for(lat: f64) -> i64 {
    (((lat + 90.0) / CELL_DEG).floor() as i64).clamp(0, ROW_MAX)
}

fn col_for(lon: f64) -> i64 {
    (((norm_lon(lon) + 180.0) / CELL_DEG).floor() as i64).clamp(0, COL_MAX)
}

pub fn cell_key(lat: f64, lon: f64) -> CellKey {
    CellKey {
        row: row_for(lat),
        col: col_for(lon),
    }
}

#[derive(Debug, Default)]
pub struct SpatialGrid {
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SpatialGrid {
    /// Rebuild the index from scratch over `rects`. Call again whenever the
    /// owning dataset is reloaded or appended to; never update incrementally
    /// mid-run.
    pub fn build(rects: &[TileRect]) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
        };
        for (idx, rect) in rects.iter().enumerate() {
            grid.insert(idx, rect);
        }
        grid
    }

    fn insert(&mut self, idx: usize, rect: &TileRect) {
        let row_lo = row_for(rect.lat_min);
        let row_hi = row_for(rect.lat_max);

        if rect.wraps_antimeridian() {
            // Split into [lon_min, 180 - delta] and [-180, lon_max] so both
            // spans are monotone in column index.
            self.insert_span(idx, row_lo, row_hi, rect.lon_min, 180.0 - WRAP_DELTA);
            self.insert_span(idx, row_lo, row_hi, -180.0, rect.lon_max);
        } else {
            self.insert_span(idx, row_lo, row_hi, rect.lon_min, rect.lon_max);
        }
    }

    fn insert_span(&mut self, idx: usize, row_lo: i64, row_hi: i64, lon_a: f64, lon_b: f64) {
        let col_lo = col_for(lon_a);
        let col_hi = col_for(lon_b);
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                self.cells.entry(CellKey { row, col }).or_default().push(idx);
            }
        }
    }

    /// Probe the 3x3 neighborhood around `(lat, lon)` and return the first
    /// rectangle index whose `contains` test succeeds, in bucket-discovery
    /// order.
    pub fn query_first(&self, rects: &[TileRect], lat: f64, lon: f64) -> Option<usize> {
        let center = cell_key(lat, lon);
        for row in (center.row - 1).max(0)..=(center.row + 1).min(ROW_MAX) {
            for col in (center.col - 1).max(0)..=(center.col + 1).min(COL_MAX) {
                if let Some(bucket) = self.cells.get(&CellKey { row, col }) {
                    for &idx in bucket {
                        if contains(&rects[idx], lat, lon) {
                            return Some(idx);
                        }
                    }
                }
            }
        }
        None
    }

    /// Probe the 3x3 neighborhood and return every distinct rectangle index
    /// whose `contains` test succeeds (deduplicated; a rectangle can appear
    /// in more than one probed cell).
    pub fn query_all(&self, rects: &[TileRect], lat: f64, lon: f64) -> Vec<usize> {
        let center = cell_key(lat, lon);
        let mut hits = Vec::new();
        for row in (center.row - 1).max(0)..=(center.row + 1).min(ROW_MAX) {
            for col in (center.col - 1).max(0)..=(center.col + 1).min(COL_MAX) {
                if let Some(bucket) = self.cells.get(&CellKey { row, col }) {
                    for &idx in bucket {
                        if contains(&rects[idx], lat, lon) && !hits.contains(&idx) {
                            hits.push(idx);
                        }
                    }
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_completeness_plain_rect() {
        let rects = vec![TileRect::new(10.0, 20.0, 30.0, 40.0)];
        let grid = SpatialGrid::build(&rects);
        assert_eq!(grid.query_first(&rects, 15.0, 35.0), Some(0));
        assert_eq!(grid.query_first(&rects, 0.0, 0.0), None);
    }

    #[test]
    fn test_index_completeness_wrap_rect() {
        let rects = vec![TileRect::new(-5.0, 5.0, 170.0, -170.0)];
        let grid = SpatialGrid::build(&rects);
        assert_eq!(grid.query_first(&rects, 0.0, 175.0), Some(0));
        assert_eq!(grid.query_first(&rects, 0.0, -175.0), Some(0));
        assert_eq!(grid.query_first(&rects, 0.0, 0.0), None);
    }

    #[test]
    fn test_query_all_dedups() {
        let rects = vec![TileRect::new(-5.0, 5.0, 170.0, -170.0)];
        let grid = SpatialGrid::build(&rects);
        let hits = grid.query_all(&rects, 0.0, 179.9999);
        assert_eq!(hits, vec![0]);
    }
}
