use thiserror::Error;

use crate::profile::FieldTag;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to decode line: {0}")]
    DecodeError(String),

    #[error("data line holds {got} values, expected {expected}")]
    ParseError { expected: usize, got: usize },

    #[error("non-numeric value for {0}: {1:?}")]
    ConversionError(FieldTag, String),

    #[error("failed to sink record: {0}")]
    SinkError(String),

    #[error("transport stream failed: {0}")]
    StreamError(#[from] std::io::Error),
}

impl IngestError {
    /// Label value for the dropped-line counters.
    pub fn cause(&self) -> &'static str {
        match self {
            IngestError::DecodeError(_) => "decode_error",
            IngestError::ParseError { .. } => "parse_error",
            IngestError::ConversionError(..) => "conversion_error",
            IngestError::SinkError(_) => "sink_error",
            IngestError::StreamError(_) => "stream_error",
        }
    }
}
