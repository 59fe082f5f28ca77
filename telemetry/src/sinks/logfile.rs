use async_trait::async_trait;
use metrics::counter;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::api::IngestError;
use crate::config::LogFormat;
use crate::event::ProcessedRecord;
use crate::sinks::Record;

/// Appends one line per record to a local log file. The handle is opened
/// once at startup and owned for the process lifetime; the mutex keeps
/// writes whole if the pipeline ever grows concurrent writers.
pub struct LogFileSink {
    file: Mutex<File>,
    format: LogFormat,
}

impl LogFileSink {
    pub async fn new(path: &str, format: LogFormat) -> anyhow::Result<LogFileSink> {
        info!("appending records to {path}");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(LogFileSink {
            file: Mutex::new(file),
            format,
        })
    }
}

#[async_trait]
impl Record for LogFileSink {
    fn name(&self) -> &'static str {
        "logfile"
    }

    async fn send(&self, record: &ProcessedRecord) -> Result<(), IngestError> {
        let mut line = match self.format {
            LogFormat::Pretty => record.log_line(),
            LogFormat::Ndjson => record.document().to_string(),
        };
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| IngestError::SinkError(format!("log file write failed: {e}")))?;
        counter!("telemetry_records_ingested_total", "sink" => "logfile").increment(1);

        Ok(())
    }

    async fn flush(&self) -> Result<(), IngestError> {
        let mut file = self.file.lock().await;
        file.flush()
            .await
            .map_err(|e| IngestError::SinkError(format!("log file flush failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::event::{FieldValue, ProcessedRecord};
    use crate::profile::DHT;

    fn record(humidity: &str, temperature: &str) -> ProcessedRecord {
        ProcessedRecord {
            profile: &DHT,
            timestamp: Utc.with_ymd_and_hms(2023, 10, 15, 14, 30, 0).unwrap(),
            values: vec![
                FieldValue::Raw(humidity.to_string()),
                FieldValue::Raw(temperature.to_string()),
            ],
        }
    }

    #[tokio::test]
    async fn pretty_format_appends_one_labeled_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.log");
        let sink = LogFileSink::new(path.to_str().unwrap(), LogFormat::Pretty)
            .await
            .unwrap();

        sink.send(&record("55.2", "21.4")).await.unwrap();
        sink.send(&record("48.1", "20.0")).await.unwrap();
        sink.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "humidity (%): 55.2, temperature (°C): 21.4\n\
             humidity (%): 48.1, temperature (°C): 20.0\n"
        );
    }

    #[tokio::test]
    async fn ndjson_format_appends_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.log");
        let sink = LogFileSink::new(path.to_str().unwrap(), LogFormat::Ndjson)
            .await
            .unwrap();

        sink.send(&record("55.2", "21.4")).await.unwrap();
        sink.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim_end()).unwrap();
        assert_eq!(parsed["humidity"], "55.2");
        assert_eq!(parsed["timestamp"], "2023-10-15T14:30:00.000Z");
    }

    #[tokio::test]
    async fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.log");

        let sink = LogFileSink::new(path.to_str().unwrap(), LogFormat::Pretty)
            .await
            .unwrap();
        sink.send(&record("55.2", "21.4")).await.unwrap();
        sink.flush().await.unwrap();
        drop(sink);

        let sink = LogFileSink::new(path.to_str().unwrap(), LogFormat::Pretty)
            .await
            .unwrap();
        sink.send(&record("48.1", "20.0")).await.unwrap();
        sink.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
