//! Country and POI tile datasets, loaded once per run and indexed by a
//! fresh `SpatialGrid`.

pub mod poi;
pub mod territory;

pub use poi::{PoiDataset, PoiTile};
pub use territory::{CountryTile, TerritoryDataset};
