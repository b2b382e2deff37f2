//! Solar PV metrics exporter.
//!
//! Two pipelines share one shape: obtain the latest observation, compute a
//! fixed set of derived scalars, publish them as Prometheus gauges, sleep,
//! repeat. The `exporter.source` config setting selects the CSV-driven
//! batch pipeline or the weather-API-driven live pipeline.

pub mod calc;
pub mod config;
pub mod domain;
pub mod error;
pub mod exporter;
pub mod loader;
pub mod metrics;
pub mod server;
pub mod telemetry;
pub mod weather;
