//! Observation types shared by the loaders, calculators and publishers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One inverter reading, taken from the most recent row of the CSV export.
/// Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub power_dc1_w: f64,
    pub power_dc2_w: f64,
    pub power_ac_w: f64,
    pub energy_today_kwh: f64,
    pub energy_total_kwh: f64,
    pub module_temp_c: f64,
    pub ambient_temp_c: f64,
    pub voltage_dc1_v: f64,
    pub voltage_dc2_v: f64,
}

impl Sample {
    /// Combined DC input power from both strings.
    pub fn total_dc_w(&self) -> f64 {
        self.power_dc1_w + self.power_dc2_w
    }
}

/// One current-weather observation from the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    pub cloud_cover_percent: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub uv_index: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_dc_sums_both_strings() {
        let sample = Sample {
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            power_dc1_w: 600.0,
            power_dc2_w: 400.0,
            power_ac_w: 900.0,
            energy_today_kwh: 12.5,
            energy_total_kwh: 4321.0,
            module_temp_c: 41.0,
            ambient_temp_c: 24.0,
            voltage_dc1_v: 380.0,
            voltage_dc2_v: 375.0,
        };
        assert_eq!(sample.total_dc_w(), 1000.0);
    }
}
