use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::api::IngestError;
use crate::profile::SensorProfile;

/// A finalized field value. Identity fields keep the raw token and index as
/// JSON strings; scaled fields index as numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Raw(String),
    Converted(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Raw(value) => f.write_str(value),
            FieldValue::Converted(value) => write!(f, "{value}"),
        }
    }
}

/// Raw values of one data line, positionally aligned with the profile's
/// field schema. Holds exactly one value per expected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub values: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub enum LineClass {
    /// Anything not starting with the profile marker: boot chatter, blank
    /// lines, partial first reads.
    Noise,
    /// Starts with the marker but carries no key=value pair, like the
    /// column header the device echoes at boot.
    Header,
    Data(Measurement),
}

/// Classifies one decoded line against the profile's data-line shape.
///
/// Data lines split on `,` into `key=value` tokens; the value halves map
/// positionally onto the field schema. Missing values fail the line, extra
/// values are ignored.
pub fn classify(line: &str, profile: &SensorProfile) -> Result<LineClass, IngestError> {
    if !line.starts_with(profile.marker) {
        return Ok(LineClass::Noise);
    }

    let values: Vec<&str> = line
        .split(',')
        .filter_map(|token| token.split_once('=').map(|(_, value)| value))
        .collect();

    if values.is_empty() {
        return Ok(LineClass::Header);
    }
    if values.len() < profile.fields.len() {
        return Err(IngestError::ParseError {
            expected: profile.fields.len(),
            got: values.len(),
        });
    }

    Ok(LineClass::Data(Measurement {
        values: values[..profile.fields.len()]
            .iter()
            .map(|value| value.trim().to_string())
            .collect(),
    }))
}

/// One complete measurement cycle: capture timestamp plus the converted
/// values, in schema order. Immutable once built; rendered once into the
/// log line and once into the store document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub profile: &'static SensorProfile,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<FieldValue>,
}

impl ProcessedRecord {
    /// Human-readable form, without the trailing newline.
    pub fn log_line(&self) -> String {
        self.profile
            .fields
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| format!("{}: {}", spec.label, value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Document submitted to the store, timestamp first.
    pub fn document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(
            self.profile.timestamp_key.to_string(),
            json!(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        for (spec, value) in self.profile.fields.iter().zip(&self.values) {
            doc.insert(spec.doc_key.to_string(), json!(value));
        }
        Value::Object(doc)
    }
}
