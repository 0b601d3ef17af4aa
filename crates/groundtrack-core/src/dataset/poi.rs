//! Point-of-interest tile dataset: loading, and append-on-save back to the
//! persistent POI CSV.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::geo::TileRect;

const KM_PER_DEG_LAT: f64 = 110.574;
const KM_PER_DEG_LON_AT_EQUATOR: f64 = 111.320;

#[derive(Debug, Clone, PartialEq)]
pub struct PoiTile {
    pub rect: TileRect,
    pub name: String,
    pub poi_type: String,
    pub tile_km: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct PoiDataset {
    pub tiles: Vec<PoiTile>,
}

impl PoiDataset {
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

        let name_idx = header_index(&headers, "name");
        let type_idx = header_index(&headers, "type");
        let rect_cols = RectColumns::find(&headers);

        let mut tiles = Vec::new();
        let mut skipped = 0u64;

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping unparseable POI row: {e}");
                    skipped += 1;
                    continue;
                }
            };

            let name = name_idx.and_then(|i| record.get(i)).unwrap_or("").trim();
            if name.is_empty() {
                skipped += 1;
                continue;
            }
            let poi_type = type_idx.and_then(|i| record.get(i)).unwrap_or("").trim().to_string();

            let parsed = match &rect_cols {
                Some(RectColumns::Bounds { lat_min, lat_max, lon_min, lon_max }) => record
                    .get(*lat_min)
                    .zip(record.get(*lat_max))
                    .zip(record.get(*lon_min))
                    .zip(record.get(*lon_max))
                    .and_then(|(((a, b), c), d)| {
                        Some((
                            a.trim().parse::<f64>().ok()?,
                            b.trim().parse::<f64>().ok()?,
                            c.trim().parse::<f64>().ok()?,
                            d.trim().parse::<f64>().ok()?,
                            None::<f64>,
                        ))
                    }),
                Some(RectColumns::CenterTile { center_lat, center_lon, tile_km }) => record
                    .get(*center_lat)
                    .zip(record.get(*center_lon))
                    .zip(record.get(*tile_km))
                    .and_then(|((a, b), c)| {
                        let lat_c: f64 = a.trim().parse().ok()?;
                        let lon_c: f64 = b.trim().parse().ok()?;
                        let km: f64 = c.trim().parse().ok()?;
                        let half_lat = km / 2.0 / KM_PER_DEG_LAT;
                        let half_lon =
                            km / 2.0 / (KM_PER_DEG_LON_AT_EQUATOR * lat_c.to_radians().cos());
                        Some((
                            lat_c - half_lat,
                            lat_c + half_lat,
                            lon_c - half_lon,
                            lon_c + half_lon,
                            Some(km),
                        ))
                    }),
                None => None,
            };

            match parsed {
                Some((lat_min, lat_max, lon_min, lon_max, tile_km)) => {
                    tiles.push(PoiTile {
                        rect: TileRect::new(lat_min, lat_max, lon_min, lon_max),
                        name: name.to_string(),
                        poi_type,
                        tile_km,
                    });
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("POI dataset {path:?}: skipped {skipped} row(s) with missing/invalid columns");
        }

        Ok(Self { tiles })
    }

    /// Append a user-added POI tile to the persistent dataset CSV in the
    /// 9-column format: `Name,Type,Tile_km,Center_Lat,Center_Lon,Lat_min,
    /// Lat_max,Lon_min,Lon_max`, numeric fields at 10 decimal places.
    pub fn append(path: impl AsRef<Path>, tile: &PoiTile) -> Result<()> {
        let (center_lat, center_lon) = tile.rect.center();
        let line = format!(
            "{},{},{},{:.10},{:.10},{:.10},{:.10},{:.10},{:.10}\n",
            csv_field(&tile.name),
            csv_field(&tile.poi_type),
            tile.tile_km.map(|k| format!("{k:.10}")).unwrap_or_default(),
            center_lat,
            center_lon,
            tile.rect.lat_min,
            tile.rect.lat_max,
            tile.rect.lon_min,
            tile.rect.lon_max,
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|e| CoreError::ExportWriteError(format!("{:?}: {e}", path.as_ref())))?;
        file.write_all(line.as_bytes())
            .map_err(|e| CoreError::ExportWriteError(format!("{:?}: {e}", path.as_ref())))?;
        Ok(())
    }
}

enum RectColumns {
    Bounds {
        lat_min: usize,
        lat_max: usize,
        lon_min: usize,
        lon_max: usize,
    },
    CenterTile {
        center_lat: usize,
        center_lon: usize,
        tile_km: usize,
    },
}

impl RectColumns {
    fn find(headers: &StringRecord) -> Option<Self> {
        if let (Some(lat_min), Some(lat_max), Some(lon_min), Some(lon_max)) = (
            header_index(headers, "lat_min"),
            header_index(headers, "lat_max"),
            header_index(headers, "lon_min"),
            header_index(headers, "lon_max"),
        ) {
            return Some(Self::Bounds {
                lat_min,
                lat_max,
                lon_min,
                lon_max,
            });
        }
        if let (Some(center_lat), Some(center_lon), Some(tile_km)) = (
            header_index(headers, "center_lat"),
            header_index(headers, "center_lon"),
            header_index(headers, "tile_km"),
        ) {
            return Some(Self::CenterTile {
                center_lat,
                center_lon,
                tile_km,
            });
        }
        None
    }
}

fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Minimal CSV field quoting for the append format: only `Name`/`Type`
/// carry free text, numeric fields never need quoting.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
