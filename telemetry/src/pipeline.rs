use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::api::IngestError;
use crate::event::{classify, LineClass, Measurement, ProcessedRecord};
use crate::profile::SensorProfile;
use crate::sinks::Record;
use crate::source::LineSource;
use crate::time::TimeSource;

/// Classify one line and convert it into a record. `Ok(None)` covers noise
/// and header lines, which are dropped without error.
pub fn process_line(
    line: &str,
    profile: &'static SensorProfile,
    now: DateTime<Utc>,
) -> Result<Option<ProcessedRecord>, IngestError> {
    let measurement = match classify(line, profile)? {
        LineClass::Noise | LineClass::Header => return Ok(None),
        LineClass::Data(measurement) => measurement,
    };

    Ok(Some(convert(measurement, profile, now)?))
}

fn convert(
    measurement: Measurement,
    profile: &'static SensorProfile,
    now: DateTime<Utc>,
) -> Result<ProcessedRecord, IngestError> {
    let values = profile
        .fields
        .iter()
        .zip(&measurement.values)
        .map(|(spec, raw)| spec.conversion.apply(spec.tag, raw))
        .collect::<Result<Vec<_>, IngestError>>()?;

    Ok(ProcessedRecord {
        profile,
        timestamp: now,
        values,
    })
}

/// Pull lines until the transport ends, sinking every complete record.
/// Per-line and per-sink failures are reported and the loop moves on; only
/// a transport-level failure ends the run early. Every sink gets every
/// record: one sink failing never starves the others.
pub async fn run<R, T>(
    mut source: LineSource<R>,
    profile: &'static SensorProfile,
    sinks: &[Box<dyn Record + Send + Sync>],
    timesource: T,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    T: TimeSource,
{
    let result = loop {
        let line = match source.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("transport stream ended");
                break Ok(());
            }
            Err(err @ IngestError::DecodeError(_)) => {
                warn!("dropped line: {err}");
                counter!("telemetry_lines_dropped_total", "cause" => err.cause()).increment(1);
                continue;
            }
            Err(err) => break Err(err.into()),
        };
        counter!("telemetry_lines_read_total").increment(1);
        debug!("line: {line:?}");

        let record = match process_line(&line, profile, timesource.now()) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(err) => {
                warn!("dropped line: {err}");
                counter!("telemetry_lines_dropped_total", "cause" => err.cause()).increment(1);
                continue;
            }
        };
        info!("{}", record.log_line());

        for sink in sinks {
            if let Err(err) = sink.send(&record).await {
                counter!("telemetry_sink_errors_total", "sink" => sink.name()).increment(1);
                warn!("{} sink failed: {err}", sink.name());
            }
        }
    };

    for sink in sinks {
        if let Err(err) = sink.flush().await {
            warn!("{} sink failed to flush: {err}", sink.name());
        }
    }

    result
}
