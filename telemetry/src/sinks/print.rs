use async_trait::async_trait;
use metrics::counter;
use tracing::info;

use crate::api::IngestError;
use crate::event::ProcessedRecord;
use crate::sinks::Record;

pub struct PrintSink {}

#[async_trait]
impl Record for PrintSink {
    fn name(&self) -> &'static str {
        "print"
    }

    async fn send(&self, record: &ProcessedRecord) -> Result<(), IngestError> {
        info!("record: {}", record.document());
        counter!("telemetry_records_ingested_total", "sink" => "print").increment(1);

        Ok(())
    }
}
