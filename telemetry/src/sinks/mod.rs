use async_trait::async_trait;

use crate::api::IngestError;
use crate::event::ProcessedRecord;

pub mod elastic;
pub mod logfile;
pub mod print;

#[async_trait]
pub trait Record {
    /// Name used in sink error logs and counters.
    fn name(&self) -> &'static str;

    async fn send(&self, record: &ProcessedRecord) -> Result<(), IngestError>;

    /// Flush buffered state before shutdown. Most sinks have none.
    async fn flush(&self) -> Result<(), IngestError> {
        Ok(())
    }
}
