//! Fixed-format export writers for ground-track, territory and POI
//! results. Numeric formatting is hand-rolled rather than delegated to
//! `csv::Writer`'s `Serialize` impl because the column widths are
//! contractual (`%.5f` lat/lon, `%.3f` range, `%.1f` degrees; the
//! `step_s`/`horizon_h` preamble fields are integers).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ephemeris::EphemSample;
use crate::error::{CoreError, Result};
use crate::labeler::TerritoryRow;
use crate::poi_selector::PoiPick;

/// Optional `# key=value` preamble lines written ahead of the header row.
#[derive(Debug, Clone, Default)]
pub struct ExportMetadata {
    pub tle: Option<String>,
    pub step_s: Option<f64>,
    pub horizon_h: Option<f64>,
}

impl ExportMetadata {
    fn write_preamble(&self, out: &mut impl Write) -> std::io::Result<()> {
        if let Some(tle) = &self.tle {
            writeln!(out, "# tle={tle}")?;
        }
        if let Some(step_s) = self.step_s {
            writeln!(out, "# step_s={}", step_s.round() as i64)?;
        }
        if let Some(horizon_h) = self.horizon_h {
            writeln!(out, "# horizon_h={}", horizon_h.round() as i64)?;
        }
        Ok(())
    }
}

fn open_writer(path: &Path, bom: bool) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| CoreError::ExportWriteError(format!("{path:?}: {e}")))?;
    let mut writer = BufWriter::new(file);
    if bom {
        writer
            .write_all(&[0xEF, 0xBB, 0xBF])
            .map_err(|e| CoreError::ExportWriteError(format!("{path:?}: {e}")))?;
    }
    Ok(writer)
}

fn quote_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write a ground-track buffer (with optional country label) to
/// UTF-8-with-BOM CSV: `Time,Latitude,Longitude[,Country]`.
pub fn export_ephemeris_csv(
    path: impl AsRef<Path>,
    samples: &[EphemSample],
    countries: Option<&[String]>,
    metadata: &ExportMetadata,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = open_writer(path, true)?;
    let io_err = |e: std::io::Error| CoreError::ExportWriteError(format!("{path:?}: {e}"));

    metadata.write_preamble(&mut out).map_err(io_err)?;

    if countries.is_some() {
        writeln!(out, "Time,Latitude,Longitude,Country").map_err(io_err)?;
    } else {
        writeln!(out, "Time,Latitude,Longitude").map_err(io_err)?;
    }

    for (i, sample) in samples.iter().enumerate() {
        match countries {
            Some(labels) => writeln!(
                out,
                "{},{:.5},{:.5},{}",
                sample.time_str,
                sample.lat,
                sample.lon,
                quote_csv(labels.get(i).map(String::as_str).unwrap_or(""))
            )
            .map_err(io_err)?,
            None => writeln!(out, "{},{:.5},{:.5}", sample.time_str, sample.lat, sample.lon)
                .map_err(io_err)?,
        }
    }

    out.flush().map_err(io_err)?;
    Ok(())
}

/// Write territory labeling rows to CSV: `Time,Latitude,Longitude,Country`.
pub fn export_territory_csv(
    path: impl AsRef<Path>,
    rows: &[TerritoryRow],
    metadata: &ExportMetadata,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = open_writer(path, true)?;
    let io_err = |e: std::io::Error| CoreError::ExportWriteError(format!("{path:?}: {e}"));

    metadata.write_preamble(&mut out).map_err(io_err)?;
    writeln!(out, "Time,Latitude,Longitude,Country").map_err(io_err)?;

    for row in rows {
        writeln!(
            out,
            "{},{:.5},{:.5},{}",
            row.time_str,
            row.lat,
            row.lon,
            quote_csv(&row.country_label)
        )
        .map_err(io_err)?;
    }

    out.flush().map_err(io_err)?;
    Ok(())
}

/// Write POI selection picks to CSV:
/// `Time,Latitude,Longitude,Range_km,Direction,Name,Type`, lat/lon at
/// `%.5f`, range at `%.3f`, bearing at `%.1f` with a trailing degree sign.
pub fn export_poi_csv(
    path: impl AsRef<Path>,
    picks: &[PoiPick],
    metadata: &ExportMetadata,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = open_writer(path, true)?;
    let io_err = |e: std::io::Error| CoreError::ExportWriteError(format!("{path:?}: {e}"));

    metadata.write_preamble(&mut out).map_err(io_err)?;
    writeln!(out, "Time,Latitude,Longitude,Range_km,Direction,Name,Type").map_err(io_err)?;

    for pick in picks {
        writeln!(
            out,
            "{},{:.5},{:.5},{:.3},{:.1}\u{b0},{},{}",
            pick.time_str,
            pick.lat,
            pick.lon,
            pick.range_km,
            pick.bearing_deg,
            quote_csv(&pick.name),
            quote_csv(&pick.poi_type)
        )
        .map_err(io_err)?;
    }

    out.flush().map_err(io_err)?;
    Ok(())
}

/// Plain-text variant: tab-separated, no BOM, no quoting. Used by the
/// `--format txt` CLI flag for quick terminal-friendly output.
pub fn export_ephemeris_txt(
    path: impl AsRef<Path>,
    samples: &[EphemSample],
    countries: Option<&[String]>,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = open_writer(path, false)?;
    let io_err = |e: std::io::Error| CoreError::ExportWriteError(format!("{path:?}: {e}"));

    if countries.is_some() {
        writeln!(out, "Time\tLatitude\tLongitude\tCountry").map_err(io_err)?;
    } else {
        writeln!(out, "Time\tLatitude\tLongitude").map_err(io_err)?;
    }

    for (i, sample) in samples.iter().enumerate() {
        match countries {
            Some(labels) => writeln!(
                out,
                "{}\t{:.5}\t{:.5}\t{}",
                sample.time_str,
                sample.lat,
                sample.lon,
                labels.get(i).map(String::as_str).unwrap_or("")
            )
            .map_err(io_err)?,
            None => writeln!(out, "{}\t{:.5}\t{:.5}", sample.time_str, sample.lat, sample.lon)
                .map_err(io_err)?,
        }
    }

    out.flush().map_err(io_err)?;
    Ok(())
}
