//! Territory (country polygon) tile dataset.
//!
//! Recognized columns (by name, case-insensitive): `Lat_min`, `Lat_max`,
//! `Lon_min`, `Lon_max`, and a trailing label column holding the country
//! name. A legacy fallback format is also accepted: columns 3/4 hold the
//! tile center (longitude, latitude), column 5 the width in degrees,
//! column 6 the height in degrees, column 7 the label; the rectangle is
//! `[lat_c - h/2, lat_c + h/2] x [lon_c - w/2, lon_c + w/2]`. Rows missing
//! the columns a recognized path needs are skipped; the loader never
//! panics on malformed input.

use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::geo::TileRect;

#[derive(Debug, Clone, PartialEq)]
pub struct CountryTile {
    pub rect: TileRect,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct TerritoryDataset {
    pub tiles: Vec<CountryTile>,
}

impl TerritoryDataset {
    pub fn rects(&self) -> Vec<TileRect> {
        self.tiles.iter().map(|t| t.rect).collect()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| CoreError::DatasetLoadError(format!("{path:?}: {e}")))?;

        let headers = reader
            .headers()
            .map_err(|e| CoreError::DatasetLoadError(format!("{path:?}: {e}")))?
            .clone();

        let preferred = PreferredColumns::find(&headers);
        let mut tiles = Vec::new();
        let mut skipped = 0u64;

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping unparseable territory row: {e}");
                    skipped += 1;
                    continue;
                }
            };

            let tile = match &preferred {
                Some(cols) => cols.parse_row(&record),
                None => parse_legacy_row(&record),
            };

            match tile {
                Some(tile) => tiles.push(tile),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("territory dataset {path:?}: skipped {skipped} row(s) with missing/invalid columns");
        }

        Ok(Self { tiles })
    }
}

struct PreferredColumns {
    lat_min: usize,
    lat_max: usize,
    lon_min: usize,
    lon_max: usize,
    label: usize,
}

impl PreferredColumns {
    fn find(headers: &StringRecord) -> Option<Self> {
        let lat_min = header_index(headers, "lat_min")?;
        let lat_max = header_index(headers, "lat_max")?;
        let lon_min = header_index(headers, "lon_min")?;
        let lon_max = header_index(headers, "lon_max")?;
        let label = header_index(headers, "country")
            .or_else(|| header_index(headers, "label"))
            .unwrap_or(headers.len().saturating_sub(1));
        Some(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
            label,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Option<CountryTile> {
        let lat_min: f64 = record.get(self.lat_min)?.trim().parse().ok()?;
        let lat_max: f64 = record.get(self.lat_max)?.trim().parse().ok()?;
        let lon_min: f64 = record.get(self.lon_min)?.trim().parse().ok()?;
        let lon_max: f64 = record.get(self.lon_max)?.trim().parse().ok()?;
        let label = record.get(self.label).unwrap_or("").trim().to_string();

        Some(CountryTile {
            rect: TileRect::new(lat_min, lat_max, lon_min, lon_max),
            label,
        })
    }
}

/// Legacy layout: [.., center_lon(2), center_lat(3), width_deg(4),
/// height_deg(5), label(6)] (0-indexed; "column 5/6/7" in the spec's
/// 1-indexed prose).
fn parse_legacy_row(record: &StringRecord) -> Option<CountryTile> {
    let center_lon: f64 = record.get(2)?.trim().parse().ok()?;
    let center_lat: f64 = record.get(3)?.trim().parse().ok()?;
    let width: f64 = record.get(4)?.trim().parse().ok()?;
    let height: f64 = record.get(5)?.trim().parse().ok()?;
    let label = record.get(6).unwrap_or("").trim().to_string();

    Some(CountryTile {
        rect: TileRect::new(
            center_lat - height / 2.0,
            center_lat + height / 2.0,
            center_lon - width / 2.0,
            center_lon + width / 2.0,
        ),
        label,
    })
}

fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_preferred_columns_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Lat_min,Lat_max,Lon_min,Lon_max,Country").unwrap();
        writeln!(file, "49.9,60.9,-8.6,1.8,United Kingdom").unwrap();
        writeln!(file, "41.3,51.1,-5.1,9.6,France").unwrap();

        let dataset = TerritoryDataset::load(file.path()).unwrap();
        assert_eq!(dataset.tiles.len(), 2);
        assert_eq!(dataset.tiles[0].label, "United Kingdom");
    }

    #[test]
    fn test_missing_required_columns_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Lat_min,Lat_max,Lon_min,Lon_max,Country").unwrap();
        writeln!(file, "49.9,60.9,-8.6,1.8,United Kingdom").unwrap();
        writeln!(file, "not_a_number,60.9,-8.6,1.8,Broken").unwrap();

        let dataset = TerritoryDataset::load(file.path()).unwrap();
        assert_eq!(dataset.tiles.len(), 1);
    }

    #[test]
    fn test_legacy_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,center_lon,center_lat,width,height,label").unwrap();
        writeln!(file, "1,x,-3.5,55.4,20.0,22.0,United Kingdom").unwrap();

        let dataset = TerritoryDataset::load(file.path()).unwrap();
        assert_eq!(dataset.tiles.len(), 1);
        assert_eq!(dataset.tiles[0].label, "United Kingdom");
    }
}
