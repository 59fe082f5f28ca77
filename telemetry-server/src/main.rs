use envconfig::Envconfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use telemetry::config::Config;
use telemetry::server::serve;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() {
    let config = Config::init_from_env().expect("Invalid configuration:");

    // Log to stdout with a level configured by the RUST_LOG envvar (default=INFO)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Don't install the recorder unless asked to; the library is usable
    // without a metrics endpoint.
    if config.export_prometheus {
        PrometheusBuilder::new()
            .with_http_listener(config.metrics_address)
            .install()
            .expect("failed to install Prometheus metrics exporter");
    }

    serve(config, shutdown())
        .await
        .expect("ingestion pipeline failed");
}
