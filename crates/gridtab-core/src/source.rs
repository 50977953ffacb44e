use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Supplies the collection a view filters. Loading and failure states
/// belong here, not in the reducer.
pub trait RecordSource<R> {
    fn load(&self) -> anyhow::Result<Vec<R>>;

    fn describe(&self) -> String;
}

/// Deterministic in-memory collection built by a page's mock generator.
pub struct MockSource<R> {
    count: usize,
    now: DateTime<Utc>,
    generate: fn(usize, DateTime<Utc>) -> Vec<R>,
}

impl<R> MockSource<R> {
    pub fn new(count: usize, now: DateTime<Utc>, generate: fn(usize, DateTime<Utc>) -> Vec<R>) -> Self {
        Self {
            count,
            now,
            generate,
        }
    }
}

impl<R> RecordSource<R> for MockSource<R> {
    #[tracing::instrument(skip(self), fields(count = self.count))]
    fn load(&self) -> anyhow::Result<Vec<R>> {
        let records = (self.generate)(self.count, self.now);
        debug!(count = records.len(), "generated mock records");
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("mock ({} records)", self.count)
    }
}

/// A JSON file holding an array of records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<R: DeserializeOwned> RecordSource<R> for JsonFileSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> anyhow::Result<Vec<R>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let records = parse_records(&text)
            .with_context(|| format!("failed to parse records in {}", self.path.display()))?;
        info!(count = records.len(), "loaded records");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Accepts either a bare array or an object wrapping it under `data`
/// or `items`, the two envelopes list endpoints tend to use.
pub fn parse_records<R: DeserializeOwned>(text: &str) -> anyhow::Result<Vec<R>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let array = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove("data")
            .or_else(|| map.remove("items"))
            .ok_or_else(|| anyhow!("expected a JSON array or an object with `data`/`items`"))?,
        other => return Err(anyhow!("expected a JSON array of records, got {other}")),
    };
    Ok(serde_json::from_value(array)?)
}
