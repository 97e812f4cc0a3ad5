use crate::error::ChartError;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Timestamp layout used by the recorder database
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Category assigned to detections the classifier left empty
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A single detection: when it happened and which species it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: DateTime<FixedOffset>,
    pub category: String,
}

impl Event {
    pub fn new(timestamp: DateTime<FixedOffset>, category: impl Into<String>) -> Self {
        Event {
            timestamp,
            category: category.into(),
        }
    }
}

/// Record shape served by the data source. The recorder database names the
/// columns `datetime` and `auto_batid`; both spellings are accepted and any
/// other columns (file path, probability, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(alias = "datetime")]
    pub timestamp: String,
    #[serde(alias = "auto_batid", default)]
    pub category: Option<String>,
}

impl TryFrom<RawRecord> for Event {
    type Error = ChartError;

    fn try_from(record: RawRecord) -> Result<Self, Self::Error> {
        let category = record
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
        Ok(Event::new(parse_timestamp(&record.timestamp)?, category))
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ChartError> {
    DateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|source| {
        ChartError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })
}

/// Serialized form of an event export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    }
}

impl FromStr for InputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "csv" => Ok(InputFormat::Csv),
            other => Err(anyhow!("Unknown input format '{}' (expected json or csv)", other)),
        }
    }
}

pub fn read_events<R: Read>(reader: R, format: InputFormat) -> Result<Vec<Event>> {
    match format {
        InputFormat::Json => read_json_events(reader),
        InputFormat::Csv => read_csv_events(reader),
    }
}

/// Read a JSON array of records
pub fn read_json_events<R: Read>(reader: R) -> Result<Vec<Event>> {
    let records: Vec<RawRecord> =
        serde_json::from_reader(reader).context("Failed to parse event records as JSON")?;

    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            Event::try_from(record)
                .with_context(|| format!("Invalid event record at index {}", idx))
        })
        .collect()
}

/// Read a CSV export with a header row
pub fn read_csv_events<R: Read>(reader: R) -> Result<Vec<Event>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut events = Vec::new();
    for (row_idx, result) in reader.deserialize::<RawRecord>().enumerate() {
        let record = result
            .with_context(|| format!("Failed to read CSV record at row {}", row_idx + 1))?;
        let event = Event::try_from(record)
            .with_context(|| format!("Invalid event record at row {}", row_idx + 1))?;
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-06-01 23:50:00+0200").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 7200);
        assert_eq!(ts.to_rfc3339(), "2024-06-01T23:50:00+02:00");
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        let err = parse_timestamp("2024-06-01T23:50:00").unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_read_json_events_with_aliases() {
        let json = r#"[
            {"timestamp": "2024-06-01 23:50:00+0000", "category": "Pipistrellus"},
            {"datetime": "2024-06-02 00:10:00+0000", "auto_batid": "Myotis", "auto_id_prob": 0.8},
            {"datetime": "2024-06-02 01:00:00+0000", "auto_batid": null}
        ]"#;
        let events = read_json_events(Cursor::new(json)).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].category, "Pipistrellus");
        assert_eq!(events[1].category, "Myotis");
        assert_eq!(events[2].category, UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_read_json_events_rejects_bad_timestamp() {
        let json = r#"[{"timestamp": "yesterday", "category": "A"}]"#;
        let err = read_json_events(Cursor::new(json)).unwrap_err();
        assert!(format!("{:#}", err).contains("index 0"));
    }

    #[test]
    fn test_read_json_events_empty_array() {
        let events = read_json_events(Cursor::new("[]")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_read_csv_events() {
        let csv = "filepath,datetime,auto_batid,auto_id_prob\n\
                   a.wav,2024-06-01 23:50:00+0000,Nyctalus,0.9\n\
                   b.wav,2024-06-02 00:10:00+0000,,0.1\n";
        let events = read_csv_events(Cursor::new(csv)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].category, "Nyctalus");
        assert_eq!(events[1].category, UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_input_format_from_path() {
        assert_eq!(InputFormat::from_path(Path::new("export.CSV")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("bats.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("-")), InputFormat::Json);
    }
}
