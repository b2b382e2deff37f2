//! # CSV Loader
//!
//! Reads the inverter export (`pv_data.csv`) and produces the most recent
//! [`Sample`] plus the file-wide daily yield. Column headers are the
//! upstream export's verbatim German labels; they are the integration
//! contract and are matched exactly (after whitespace trimming, since the
//! export pads them).

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::Sample;
use crate::error::ExporterError;

/// A full read of the data file: the latest reading and the summed daily
/// yield the energy split is computed from.
#[derive(Debug, Clone)]
pub struct PvData {
    pub latest: Sample,
    /// Sum of `Energie_Heute (kWh)` over every row, as the upstream
    /// exporter splits the whole file's yield rather than the last row's.
    pub yield_sum_kwh: f64,
}

pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the file and return the last row plus the yield sum.
    /// Any missing, empty, or malformed input maps to
    /// [`ExporterError::DataUnavailable`].
    pub fn load(&self) -> Result<PvData, ExporterError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.unavailable(e))?;

        let mut latest: Option<RawRow> = None;
        let mut yield_sum_kwh = 0.0;
        for row in reader.deserialize::<RawRow>() {
            let row = row.map_err(|e| self.unavailable(e))?;
            yield_sum_kwh += row.energy_today_kwh;
            latest = Some(row);
        }

        let latest = latest
            .ok_or_else(|| ExporterError::DataUnavailable(format!(
                "{}: no data rows",
                self.path.display()
            )))?
            .into_sample()
            .map_err(|e| self.unavailable(e))?;

        Ok(PvData {
            latest,
            yield_sum_kwh,
        })
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> ExporterError {
        ExporterError::DataUnavailable(format!("{}: {}", self.path.display(), err))
    }
}

/// One CSV row under the upstream column naming.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Datum")]
    date: String,
    #[serde(rename = "Uhrzeit")]
    time: String,
    #[serde(rename = "Leistung_DC_1 (W)")]
    power_dc1_w: f64,
    #[serde(rename = "Leistung_DC_2 (W)")]
    power_dc2_w: f64,
    #[serde(rename = "Leistung_AC (W)")]
    power_ac_w: f64,
    #[serde(rename = "Energie_Heute (kWh)")]
    energy_today_kwh: f64,
    #[serde(rename = "Energie_Gesamt (kWh)")]
    energy_total_kwh: f64,
    #[serde(rename = "Modultemperatur (°C)")]
    module_temp_c: f64,
    #[serde(rename = "Umgebungstemperatur (°C)")]
    ambient_temp_c: f64,
    #[serde(rename = "Spannung_DC_1 (V)")]
    voltage_dc1_v: f64,
    #[serde(rename = "Spannung_DC_2 (V)")]
    voltage_dc2_v: f64,
}

impl RawRow {
    fn into_sample(self) -> Result<Sample, String> {
        let timestamp = parse_timestamp(&self.date, &self.time)?;
        Ok(Sample {
            timestamp,
            power_dc1_w: self.power_dc1_w,
            power_dc2_w: self.power_dc2_w,
            power_ac_w: self.power_ac_w,
            energy_today_kwh: self.energy_today_kwh,
            energy_total_kwh: self.energy_total_kwh,
            module_temp_c: self.module_temp_c,
            ambient_temp_c: self.ambient_temp_c,
            voltage_dc1_v: self.voltage_dc1_v,
            voltage_dc2_v: self.voltage_dc2_v,
        })
    }
}

/// Combine the separate `Datum` and `Uhrzeit` columns into one timestamp.
/// Exports come in ISO or German day-first form depending on locale.
fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, String> {
    let combined = format!("{} {}", date.trim(), time.trim());
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&combined, format) {
            return Ok(ts);
        }
    }
    Err(format!("unparseable timestamp '{combined}'"))
}
