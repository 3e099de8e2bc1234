// Cribl Search API documentation: https://docs.cribl.io/api/
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use crate::id::JobId;

/// Record field holding the event timestamp as epoch seconds
pub const TIME_FIELD: &str = "_time";

/// One event record as it appears on an NDJSON results line
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub items: Vec<SubmittedJobDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedJobDto {
    pub id: JobId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub items: Vec<JobStatusDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusDto {
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<CompactString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetsResponse {
    pub items: Vec<DatasetDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetDto {
    #[serde(default)]
    pub id: Option<CompactString>,
    #[serde(default)]
    pub name: Option<CompactString>,
}

impl DatasetDto {
    /// Name usable in a query: a non-empty `id` wins, then `name`, then ""
    pub fn query_name(&self) -> CompactString {
        self.id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether polling can stop at this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

/// Metadata record leading every NDJSON results page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsMetadata {
    #[serde(default)]
    pub total_event_count: u64,
}

/// One parsed page of results
#[derive(Debug, Clone)]
pub struct ResultsPage {
    pub metadata: ResultsMetadata,
    pub records: Vec<Record>,
}

/// Flat tabular view over all result records of a query
///
/// Rows keep arrival order. Columns are the union of record keys in order
/// of first appearance. Values under [`TIME_FIELD`] are reinterpreted as
/// UTC instants from epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<CompactString>,
    rows: Vec<Vec<Cell>>,
    total_count: u64,
}

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Scalar exactly as it appeared in the record
    Value(Value),
    /// Epoch seconds reinterpreted as a UTC instant
    Instant(DateTime<Utc>),
    /// The record had no value for this column
    Missing,
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Value(value) => value.as_str(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Value(value) => value.as_f64(),
            _ => None,
        }
    }

    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::Instant(instant) => Some(*instant),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl ResultTable {
    /// Assemble a table from records concatenated across result pages
    pub fn from_records(records: Vec<Record>, total_count: u64) -> Self {
        let columns: Vec<CompactString> = records
            .iter()
            .flat_map(|record| record.keys())
            .unique()
            .map(|key| CompactString::from(key.as_str()))
            .collect();

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|column| match record.remove(column.as_str()) {
                        Some(value) if column == TIME_FIELD => time_cell(value),
                        Some(value) => Cell::Value(value),
                        None => Cell::Missing,
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows, total_count }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[CompactString] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// All cells of a named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Cell at a row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|cells| &cells[index])
    }

    /// Server-reported total event count for the query
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

fn time_cell(value: Value) -> Cell {
    let instant = value
        .as_f64()
        .and_then(|secs| DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64));
    match instant {
        Some(instant) => Cell::Instant(instant),
        None => Cell::Value(value),
    }
}
