//! Cancellable, chunk-streaming 1 Hz (or coarser) SGP4 ground-track
//! generator. Fills an ordered `EphemBuffer` and hands it to a streaming
//! consumer without stalling the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::config::ObserverSite;
use crate::error::{CoreError, Result};
use crate::propagator::{self, SatState};
use crate::sink::StreamingSink;
use crate::time::{format_utc, jd_to_utc};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EphemSample {
    pub jd: f64,
    pub time_str: String,
    pub lat: f64,
    pub lon: f64,
}

/// Owns its samples; insertion order equals temporal order.
#[derive(Debug, Clone, Default)]
pub struct EphemBuffer {
    pub samples: Vec<EphemSample>,
}

impl EphemBuffer {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub struct EphemerisEngine;

impl EphemerisEngine {
    /// Generate exactly `floor(horizon_s / step_s) + 1` samples starting at
    /// `jd_now`, on a private clone of `state`. Polls `cancel` before every
    /// sample; on cancellation the in-flight buffer is discarded and
    /// `CoreError::Cancelled` is returned — no partial publication.
    ///
    /// `observer` is part of this engine's documented input list (it
    /// accompanies every run so a future range/bearing-to-observer sample
    /// can be added without another signature change) but the sub-satellite
    /// propagation below is purely a function of satellite state and time,
    /// so it is not read by the loop itself.
    pub fn run(
        state: &SatState,
        jd_now: f64,
        horizon_s: f64,
        step_s: f64,
        observer: &ObserverSite,
        cancel: &CancellationToken,
    ) -> Result<EphemBuffer> {
        assert!(horizon_s >= 0.0, "horizon must be non-negative");
        assert!(step_s > 0.0, "step must be positive");
        debug!(observer = %observer.name, "starting ephemeris run");

        let clone = state.clone();
        let n = (horizon_s / step_s).floor() as u64 + 1;
        let mut samples = Vec::with_capacity(n as usize);

        for k in 0..n {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            let jd = jd_now + (k as f64) * step_s / 86_400.0;
            let (lat, lon) = propagator::advance(&clone, jd)?;
            let time_str = format_utc(jd_to_utc(jd));

            samples.push(EphemSample {
                jd,
                time_str,
                lat,
                lon,
            });
        }

        Ok(EphemBuffer { samples })
    }

    /// Stream a completed buffer into `sink` in chunks of `chunk_size`,
    /// wrapped in `begin_bulk`/`end_bulk` so the downstream view can detach
    /// from its display while appending in bulk.
    pub fn stream_into(
        buffer: &EphemBuffer,
        sink: &mut dyn StreamingSink<EphemSample>,
        chunk_size: usize,
    ) {
        sink.begin_bulk();
        for chunk in buffer.samples.chunks(chunk_size.max(1)) {
            sink.append_batch(chunk);
        }
        sink.end_bulk();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObserverSite;

    const LINE1: &str = "1 25544U 98067A   24010.50000000  .00016717  00000-0  10270-3 0  9007";
    const LINE2: &str = "2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.49560190 21025";

    #[test]
    fn test_sample_count_and_monotonicity() {
        let state = SatState::from_tle(LINE1, LINE2).unwrap();
        let cancel = CancellationToken::new();
        let observer = ObserverSite::default();
        let buffer =
            EphemerisEngine::run(&state, 2_460_832.436, 3.0, 1.0, &observer, &cancel).unwrap();

        assert_eq!(buffer.len(), 4);
        for pair in buffer.samples.windows(2) {
            assert!(pair[1].jd > pair[0].jd);
            let gap_days = pair[1].jd - pair[0].jd;
            assert!((gap_days - 1.0 / 86_400.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_sample_when_horizon_zero() {
        let state = SatState::from_tle(LINE1, LINE2).unwrap();
        let cancel = CancellationToken::new();
        let observer = ObserverSite::default();
        let buffer =
            EphemerisEngine::run(&state, 2_460_832.436, 0.0, 1.0, &observer, &cancel).unwrap();
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_cancellation_publishes_nothing() {
        let state = SatState::from_tle(LINE1, LINE2).unwrap();
        let cancel = CancellationToken::new();
        let observer = ObserverSite::default();
        cancel.cancel();
        let result = EphemerisEngine::run(&state, 2_460_832.436, 10.0, 1.0, &observer, &cancel);
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }

    #[test]
    fn test_time_str_ascending() {
        let state = SatState::from_tle(LINE1, LINE2).unwrap();
        let cancel = CancellationToken::new();
        let observer = ObserverSite::default();
        let buffer =
            EphemerisEngine::run(&state, 2_460_832.436, 3.0, 1.0, &observer, &cancel).unwrap();
        let times: Vec<&str> = buffer.samples.iter().map(|s| s.time_str.as_str()).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }
}
