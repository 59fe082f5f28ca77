use std::future::Future;

use tokio_serial::SerialPortBuilderExt;
use tracing::{info, warn};

use crate::config::Config;
use crate::pipeline;
use crate::sinks::elastic::ElasticSink;
use crate::sinks::logfile::LogFileSink;
use crate::sinks::print::PrintSink;
use crate::sinks::Record;
use crate::source::LineSource;
use crate::time::{SystemTime, TimeSource};

pub async fn serve<F>(config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let profile = config.profile.profile();

    let port =
        tokio_serial::new(config.serial_device.as_str(), config.serial_baud).open_native_async()?;
    info!(
        "reading {} telemetry from {} at {} baud",
        profile.name, config.serial_device, config.serial_baud
    );

    let log_path = config.log_path.as_deref().unwrap_or(profile.log_path);
    let mut sinks: Vec<Box<dyn Record + Send + Sync>> = vec![Box::new(
        LogFileSink::new(log_path, config.log_format).await?,
    )];

    if config.print_sink {
        sinks.push(Box::new(PrintSink {}));
    } else {
        let index = profile.index.index_name(SystemTime {}.now().date_naive());
        let store = ElasticSink::new(&config.es_host, index).await?;
        store.ensure_index().await?;
        info!("indexing records into {}", store.index());
        sinks.push(Box::new(store));
    }

    tokio::select! {
        result = pipeline::run(LineSource::new(port), profile, &sinks, SystemTime {}) => result,
        _ = shutdown => {
            info!("shutting down");
            for sink in &sinks {
                if let Err(err) = sink.flush().await {
                    warn!("{} sink failed to flush: {err}", sink.name());
                }
            }
            Ok(())
        }
    }
}
