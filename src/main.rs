use anyhow::Result;
use pv_exporter::{config, exporter, loader, metrics, server, telemetry, weather};

use config::{Config, Source};
use exporter::{BatchExporter, LiveExporter};
use loader::CsvLoader;
use metrics::{LiveGauges, PvGauges};
use prometheus::Registry;
use std::time::Duration;
use telemetry::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::info;
use weather::WeatherClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    let registry = Registry::new();
    let interval = Duration::from_secs(cfg.exporter.poll_interval_seconds());
    let cancel = CancellationToken::new();

    let loop_handle = match cfg.exporter.source {
        Source::Csv => {
            let gauges = PvGauges::register(&registry)?;
            let batch = BatchExporter::new(
                CsvLoader::new(cfg.exporter.data_file.clone()),
                gauges,
                cfg.model.clone(),
            );
            let cancel = cancel.clone();
            tokio::spawn(async move { batch.run(interval, cancel).await })
        }
        Source::Weather => {
            weather::warn_if_demo(&cfg.weather);
            let gauges = LiveGauges::register(&registry)?;
            let live = LiveExporter::new(
                WeatherClient::new(&cfg.weather, &cfg.location)?,
                gauges,
                cfg.model.clone(),
            );
            let cancel = cancel.clone();
            tokio::spawn(async move { live.run(interval, cancel).await })
        }
    };

    let app = server::router(server::AppState { registry }, &cfg);
    let addr = cfg.server.socket_addr()?;
    info!(
        %addr,
        source = ?cfg.exporter.source,
        interval_seconds = interval.as_secs(),
        "starting PV exporter"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    // Signal received: end the refresh loop after its in-flight cycle.
    cancel.cancel();
    let _ = loop_handle.await;

    info!("shutdown complete");
    Ok(())
}
