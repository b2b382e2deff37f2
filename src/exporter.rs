//! # Refresh Loops
//!
//! One cooperative loop per process: fetch/load, compute, publish, sleep,
//! repeat. A failed fetch or load skips the whole cycle - nothing is
//! published, the error is logged, and the next scheduled tick is the
//! retry. Cancellation ends the loop after the in-flight cycle.

use chrono::{Local, Timelike};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::calc;
use crate::config::ModelConfig;
use crate::error::ExporterError;
use crate::loader::CsvLoader;
use crate::metrics::{LiveGauges, PvGauges};
use crate::weather::WeatherClient;

/// CSV-driven pipeline: latest inverter row plus fixed-ratio energy split.
pub struct BatchExporter {
    loader: CsvLoader,
    gauges: PvGauges,
    model: ModelConfig,
}

impl BatchExporter {
    pub fn new(loader: CsvLoader, gauges: PvGauges, model: ModelConfig) -> Self {
        Self {
            loader,
            gauges,
            model,
        }
    }

    /// One full cycle: load, derive, publish. Public so tests can drive a
    /// single cycle without the timer.
    pub fn run_cycle(&self) -> Result<(), ExporterError> {
        let data = self.loader.load()?;
        let sample = &data.latest;

        let efficiency = calc::efficiency_percent(sample.power_ac_w, sample.total_dc_w());
        let split = calc::split_energy(data.yield_sum_kwh, &self.model);
        self.gauges.publish(sample, efficiency, &split);

        info!(
            ac_power_w = sample.power_ac_w,
            energy_today_kwh = sample.energy_today_kwh,
            efficiency_percent = efficiency,
            "metrics updated"
        );
        Ok(())
    }

    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        run_loop("batch", interval, cancel, || async { self.run_cycle() }).await;
    }
}

/// Weather-driven pipeline: cloud/UV/hour heuristic against the nameplate
/// ceiling.
pub struct LiveExporter {
    client: WeatherClient,
    gauges: LiveGauges,
    model: ModelConfig,
}

impl LiveExporter {
    pub fn new(client: WeatherClient, gauges: LiveGauges, model: ModelConfig) -> Self {
        Self {
            client,
            gauges,
            model,
        }
    }

    pub async fn run_cycle(&self) -> Result<(), ExporterError> {
        self.run_cycle_at(Local::now().hour()).await
    }

    /// Cycle with an explicit hour-of-day, so tests are not bound to the
    /// wall clock.
    pub async fn run_cycle_at(&self, hour: u32) -> Result<(), ExporterError> {
        let reading = self.client.fetch_current().await?;

        let estimated = calc::estimated_power_exporter(
            reading.cloud_cover_percent,
            reading.uv_index,
            hour,
            &self.model,
        );
        let efficiency = calc::cloud_efficiency_percent(reading.cloud_cover_percent);
        self.gauges.publish(&reading, estimated, efficiency);

        info!(
            estimated_power_w = estimated,
            cloud_cover_percent = reading.cloud_cover_percent,
            temperature_c = reading.temperature_c,
            "metrics updated"
        );
        Ok(())
    }

    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        run_loop("live", interval, cancel, || self.run_cycle()).await;
    }
}

/// Shared loop shape: immediate first cycle, then one per interval tick,
/// until the token is cancelled. Cycle failures are logged and absorbed.
async fn run_loop<F, Fut>(name: &str, interval: Duration, cancel: CancellationToken, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), ExporterError>>,
{
    let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
    // An overrunning cycle must not burn through buffered ticks: the next
    // scheduled tick is the retry, never a back-to-back burst.
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                info!(exporter = name, "refresh loop stopped");
                return;
            }
        }
        if let Err(e) = cycle().await {
            warn!(exporter = name, error = %e, "cycle skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "Datum,Uhrzeit,Leistung_DC_1 (W),Leistung_DC_2 (W),Leistung_AC (W),\
        Energie_Heute (kWh),Energie_Gesamt (kWh),Modultemperatur (°C),\
        Umgebungstemperatur (°C),Spannung_DC_1 (V),Spannung_DC_2 (V)";

    #[test]
    fn batch_cycle_publishes_last_row_and_split() {
        let csv = format!(
            "{HEADER}\n\
            2024-06-01,10:00,500,400,850,5.0,1000.0,35.0,22.0,380.0,378.0\n\
            2024-06-01,11:00,600,400,900,7.0,1007.0,38.0,23.0,381.0,379.0\n"
        );
        let file = write_csv(&csv);

        let registry = Registry::new();
        let gauges = PvGauges::register(&registry).unwrap();
        let exporter = BatchExporter::new(
            CsvLoader::new(file.path()),
            gauges,
            ModelConfig::default(),
        );

        exporter.run_cycle().unwrap();

        assert_eq!(exporter.gauges.power_ac.get(), 900.0);
        assert_eq!(exporter.gauges.total_dc_power.get(), 1000.0);
        assert!((exporter.gauges.efficiency.get() - 90.0).abs() < 1e-9);
        // Split applies to the file-wide yield sum (5 + 7 kWh).
        assert!((exporter.gauges.exported_energy.get() - 4.8).abs() < 1e-9);
        assert!((exporter.gauges.self_use_energy.get() - 7.2).abs() < 1e-9);
    }

    #[test]
    fn failed_cycle_leaves_gauges_untouched() {
        let file = write_csv(HEADER); // header only, no data rows

        let registry = Registry::new();
        let gauges = PvGauges::register(&registry).unwrap();
        let exporter = BatchExporter::new(
            CsvLoader::new(file.path()),
            gauges,
            ModelConfig::default(),
        );

        exporter.gauges.power_ac.set(123.0);
        let err = exporter.run_cycle().unwrap_err();
        assert!(matches!(err, ExporterError::DataUnavailable(_)));
        assert_eq!(exporter.gauges.power_ac.get(), 123.0);
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_cycle_waits_full_interval_before_retry() {
        use std::sync::{Arc, Mutex};
        use tokio::time::Instant;

        let interval = Duration::from_secs(5);
        let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        let starts_in = starts.clone();
        let cancel_in = cancel.clone();
        run_loop("batch", interval, cancel.clone(), move || {
            let starts = starts_in.clone();
            let cancel = cancel_in.clone();
            async move {
                let stall_first = {
                    let mut starts = starts.lock().unwrap();
                    starts.push(Instant::now());
                    if starts.len() >= 4 {
                        cancel.cancel();
                    }
                    starts.len() == 1
                };
                if stall_first {
                    // First cycle overruns the interval, as a fetch
                    // timeout would.
                    tokio::time::sleep(Duration::from_secs(12)).await;
                }
                Err(ExporterError::FetchUnavailable("endpoint unreachable".into()))
            }
        })
        .await;

        let starts = starts.lock().unwrap();
        assert!(starts.len() >= 4);
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= interval,
                "retry started {gap:?} after the previous cycle, inside the {interval:?} interval"
            );
        }
    }

    #[tokio::test]
    async fn cancelled_loop_stops() {
        let file = write_csv(HEADER);
        let registry = Registry::new();
        let gauges = PvGauges::register(&registry).unwrap();
        let exporter = BatchExporter::new(
            CsvLoader::new(file.path()),
            gauges,
            ModelConfig::default(),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        // Must return promptly instead of sleeping out the interval.
        tokio::time::timeout(
            Duration::from_secs(1),
            exporter.run(Duration::from_secs(3600), cancel),
        )
        .await
        .unwrap();
    }
}
