//! # Gauge Registry
//!
//! One gauge per tracked metric, registered exactly once against an
//! explicit [`Registry`] that both the refresh loop and the HTTP server
//! hold a handle to. Gauge values are atomic f64 swaps, so scrapes may
//! overlap an in-flight publish; they simply see each gauge's last-set
//! value.

use prometheus::{Gauge, Opts, Registry};

use crate::calc::EnergySplit;
use crate::domain::{Sample, WeatherReading};

fn register_gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
    let gauge = Gauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Gauge set of the CSV-driven exporter. Names and help strings are the
/// published scrape contract.
pub struct PvGauges {
    pub power_dc1: Gauge,
    pub power_dc2: Gauge,
    pub power_ac: Gauge,
    pub energy_today: Gauge,
    pub energy_total: Gauge,
    pub module_temp: Gauge,
    pub ambient_temp: Gauge,
    pub voltage_dc1: Gauge,
    pub voltage_dc2: Gauge,
    pub total_dc_power: Gauge,
    pub efficiency: Gauge,
    pub exported_energy: Gauge,
    pub self_use_energy: Gauge,
}

impl PvGauges {
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            power_dc1: register_gauge(
                registry,
                "pv_power_dc1_watts",
                "DC Power from String 1 in Watts",
            )?,
            power_dc2: register_gauge(
                registry,
                "pv_power_dc2_watts",
                "DC Power from String 2 in Watts",
            )?,
            power_ac: register_gauge(registry, "pv_power_ac_watts", "AC Power Output in Watts")?,
            energy_today: register_gauge(
                registry,
                "pv_energy_today_kwh",
                "Energy produced today in kWh",
            )?,
            energy_total: register_gauge(
                registry,
                "pv_energy_total_kwh",
                "Total energy produced in kWh",
            )?,
            module_temp: register_gauge(
                registry,
                "pv_module_temperature_celsius",
                "Module temperature in Celsius",
            )?,
            ambient_temp: register_gauge(
                registry,
                "pv_ambient_temperature_celsius",
                "Ambient temperature in Celsius",
            )?,
            voltage_dc1: register_gauge(
                registry,
                "pv_voltage_dc1_volts",
                "DC Voltage String 1 in Volts",
            )?,
            voltage_dc2: register_gauge(
                registry,
                "pv_voltage_dc2_volts",
                "DC Voltage String 2 in Volts",
            )?,
            total_dc_power: register_gauge(
                registry,
                "pv_total_dc_power_watts",
                "Total DC Power from both strings",
            )?,
            efficiency: register_gauge(
                registry,
                "pv_efficiency_percent",
                "System efficiency (AC/DC power ratio)",
            )?,
            exported_energy: register_gauge(
                registry,
                "pv_exported_energy_kwh",
                "Energy exported to grid",
            )?,
            self_use_energy: register_gauge(
                registry,
                "pv_self_use_energy_kwh",
                "Energy used directly",
            )?,
        })
    }

    /// Set every gauge from one successful cycle's values.
    pub fn publish(&self, sample: &Sample, efficiency_percent: f64, split: &EnergySplit) {
        self.power_dc1.set(sample.power_dc1_w);
        self.power_dc2.set(sample.power_dc2_w);
        self.power_ac.set(sample.power_ac_w);
        self.energy_today.set(sample.energy_today_kwh);
        self.energy_total.set(sample.energy_total_kwh);
        self.module_temp.set(sample.module_temp_c);
        self.ambient_temp.set(sample.ambient_temp_c);
        self.voltage_dc1.set(sample.voltage_dc1_v);
        self.voltage_dc2.set(sample.voltage_dc2_v);
        self.total_dc_power.set(sample.total_dc_w());
        self.efficiency.set(efficiency_percent);
        self.exported_energy.set(split.exported_kwh);
        self.self_use_energy.set(split.self_use_kwh);
    }
}

/// Gauge set of the weather-driven exporter.
pub struct LiveGauges {
    pub estimated_power: Gauge,
    pub cloud_cover: Gauge,
    pub temperature: Gauge,
    pub humidity: Gauge,
    pub wind_speed: Gauge,
    pub uv_index: Gauge,
    pub efficiency: Gauge,
}

impl LiveGauges {
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            estimated_power: register_gauge(
                registry,
                "pv_estimated_power_watts",
                "Estimated solar power output in watts",
            )?,
            cloud_cover: register_gauge(
                registry,
                "pv_cloud_cover_percent",
                "Cloud cover percentage",
            )?,
            temperature: register_gauge(
                registry,
                "pv_temperature_celsius",
                "Ambient temperature",
            )?,
            humidity: register_gauge(registry, "pv_humidity_percent", "Humidity percentage")?,
            wind_speed: register_gauge(
                registry,
                "pv_wind_speed_mps",
                "Wind speed in meters per second",
            )?,
            uv_index: register_gauge(registry, "pv_uv_index", "UV index")?,
            efficiency: register_gauge(
                registry,
                "pv_efficiency_percent",
                "Estimated solar efficiency",
            )?,
        })
    }

    pub fn publish(
        &self,
        reading: &WeatherReading,
        estimated_power_w: f64,
        efficiency_percent: f64,
    ) {
        self.estimated_power.set(estimated_power_w);
        self.cloud_cover.set(reading.cloud_cover_percent);
        self.temperature.set(reading.temperature_c);
        self.humidity.set(reading.humidity_percent);
        self.wind_speed.set(reading.wind_speed_ms);
        self.uv_index.set(reading.uv_index);
        self.efficiency.set(efficiency_percent);
    }
}
