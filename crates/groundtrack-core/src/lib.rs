//! Ground-track generation, territory labeling and point-of-interest
//! selection for satellite pass planning.
//!
//! The pipeline is three components wired around a shared `EphemBuffer`:
//! [`ephemeris`] streams SGP4 sub-satellite points off a cancellable
//! worker, [`labeler`] resolves each point to an overflown country via a
//! [`index::SpatialGrid`], and [`poi_selector`] reduces the buffer down to
//! a closest-approach pick per point of interest. [`export`] writes any of
//! these result sets out in the pipeline's fixed CSV/TXT formats.

pub mod cancel;
pub mod config;
pub mod dataset;
pub mod ephemeris;
pub mod error;
pub mod export;
pub mod geo;
pub mod index;
pub mod labeler;
pub mod poi_selector;
pub mod propagator;
pub mod sink;
pub mod time;

pub use cancel::CancellationToken;
pub use config::{ObserverSite, RunConfig};
pub use ephemeris::{EphemBuffer, EphemSample, EphemerisEngine};
pub use error::{CoreError, Result};
pub use labeler::{TerritoryRow, TerritorySelector};
pub use poi_selector::PoiPick;
pub use propagator::SatState;
