// Where detection records come from

use crate::event::{read_events, Event, InputFormat};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

/// A provider of raw detection records.
///
/// Every fetch returns the full record set; binning happens client side.
pub trait EventSource {
    fn fetch(&mut self) -> Result<Vec<Event>>;

    /// Human readable origin for log messages
    fn describe(&self) -> String;
}

/// Records read from an export file, or from stdin when no path is given
pub struct FileSource {
    path: Option<PathBuf>,
    format: InputFormat,
}

impl FileSource {
    pub fn new(path: Option<PathBuf>, format: Option<InputFormat>) -> Self {
        let format = format.unwrap_or_else(|| match &path {
            Some(p) => InputFormat::from_path(p),
            None => InputFormat::Json,
        });
        FileSource { path, format }
    }
}

impl EventSource for FileSource {
    fn fetch(&mut self) -> Result<Vec<Event>> {
        match &self.path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open '{}'", path.display()))?;
                read_events(BufReader::new(file), self.format)
                    .with_context(|| format!("Failed to read events from '{}'", path.display()))
            }
            None => read_events(io::stdin().lock(), self.format)
                .context("Failed to read events from stdin"),
        }
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "stdin".to_string(),
        }
    }
}

/// An in-memory record set, handy for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    events: Vec<Event>,
}

impl StaticSource {
    pub fn new(events: Vec<Event>) -> Self {
        StaticSource { events }
    }
}

impl EventSource for StaticSource {
    fn fetch(&mut self) -> Result<Vec<Event>> {
        Ok(self.events.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory events", self.events.len())
    }
}
