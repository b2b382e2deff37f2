//! # Derived-Metric Calculator
//!
//! Pure functions turning one observation plus the configured model
//! constants into the published figures. No I/O, no state across cycles.
//!
//! Two estimated-power formulas coexist on purpose: the exporter variant
//! normalizes UV index by 11 and takes a whole hour, the dashboard variant
//! normalizes by 10, takes a fractional hour and derates for panel
//! temperature. They drifted apart in the upstream tooling and both sets of
//! published numbers depend on their own variant, so they stay separate.

use crate::config::ModelConfig;
use std::f64::consts::PI;

/// Fixed-ratio split of a day's yield into exported and self-used energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySplit {
    pub exported_kwh: f64,
    pub self_use_kwh: f64,
}

/// Self-power status shares for the donut view, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDistribution {
    pub direct_percent: f64,
    pub battery_percent: f64,
    pub grid_percent: f64,
}

/// Split total yield into exported and self-used energy using the
/// configured shares (40/60 by default).
pub fn split_energy(total_yield_kwh: f64, model: &ModelConfig) -> EnergySplit {
    EnergySplit {
        exported_kwh: total_yield_kwh * model.exported_share,
        self_use_kwh: total_yield_kwh * model.self_use_share,
    }
}

/// Direct/battery/grid shares as percentages (48/35/17 by default).
pub fn energy_distribution(model: &ModelConfig) -> EnergyDistribution {
    EnergyDistribution {
        direct_percent: model.direct_share * 100.0,
        battery_percent: model.battery_share * 100.0,
        grid_percent: model.grid_share * 100.0,
    }
}

/// Inverter efficiency as AC output over total DC input, in percent.
/// Defined as 0.0 when there is no DC input (night, disconnected strings).
pub fn efficiency_percent(ac_power_w: f64, total_dc_w: f64) -> f64 {
    if total_dc_w > 0.0 {
        ac_power_w / total_dc_w * 100.0
    } else {
        0.0
    }
}

/// The live exporter's efficiency figure: a straight cloud-cover discount,
/// `(100 - c) * 0.8`.
pub fn cloud_efficiency_percent(cloud_cover_percent: f64) -> f64 {
    (100.0 - cloud_cover_percent) * 0.8
}

/// Solar-elevation bell curve over the day: `|sin((h - 6) * pi / 14)|` for
/// hours within [6, 20], zero outside. Peaks near hour 13.
pub fn time_factor(hour: f64) -> f64 {
    if (6.0..=20.0).contains(&hour) {
        ((hour - 6.0) * PI / 14.0).sin().abs()
    } else {
        0.0
    }
}

/// Estimated output of the exporter pipeline: cloud factor x UV factor
/// (normalized by 11) x time-of-day factor, against the nameplate ceiling.
/// Whole hours only, no temperature derate.
pub fn estimated_power_exporter(
    cloud_cover_percent: f64,
    uv_index: f64,
    hour: u32,
    model: &ModelConfig,
) -> f64 {
    let cloud_factor = (100.0 - cloud_cover_percent) / 100.0;
    let uv_factor = (uv_index / 11.0).min(1.0);
    let estimated = model.max_power_watts * cloud_factor * uv_factor * time_factor(hour as f64);
    estimated.max(0.0)
}

/// Estimated output of the dashboard variant: UV normalized by 10,
/// fractional hour, and a temperature derate above the configured
/// threshold (0.5%/degC by default).
pub fn estimated_power_dashboard(
    cloud_cover_percent: f64,
    uv_index: f64,
    hour: f64,
    ambient_temp_c: f64,
    model: &ModelConfig,
) -> f64 {
    let cloud_factor = (100.0 - cloud_cover_percent) / 100.0;
    let uv_factor = (uv_index / 10.0).min(1.0);
    let temp_factor =
        1.0 - (ambient_temp_c - model.derate_threshold_c).max(0.0) * model.derate_per_c;
    let estimated =
        model.max_power_watts * cloud_factor * uv_factor * time_factor(hour) * temp_factor;
    estimated.max(0.0)
}
