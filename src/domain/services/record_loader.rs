use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::entities::record::{RecordKind, SourceRecord};
use crate::helper::error_chain_fmt;

/// Source rows partitioned by record kind
#[derive(Debug, Default)]
pub struct PartitionedRecords {
    pub candidates: Vec<SourceRecord>,
    pub jobs: Vec<SourceRecord>,
}

impl PartitionedRecords {
    pub fn total(&self) -> usize {
        self.candidates.len() + self.jobs.len()
    }
}

/// Raw CSV row, before the `type` column is validated
#[derive(Debug, Deserialize)]
struct RawRecordRow {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    name_or_title: String,
    text: String,
}

/// Loads the source table and partitions every row into candidates or jobs.
///
/// A row whose `type` is neither `candidate` nor `job` fails the whole load:
/// rows are never silently dropped.
#[tracing::instrument(name = "Loading records from CSV file")]
pub fn load_records(path: &Path) -> Result<PartitionedRecords, RecordLoaderError> {
    let file = File::open(path).map_err(|source| RecordLoaderError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let records = read_records(file)?;

    info!(
        nb_candidates = records.candidates.len(),
        nb_jobs = records.jobs.len(),
        "Loaded records"
    );

    Ok(records)
}

/// Parses and partitions records from any CSV reader.
///
/// Expects a header row with at least the columns `id`, `type`,
/// `name_or_title` and `text`.
pub fn read_records(reader: impl Read) -> Result<PartitionedRecords, RecordLoaderError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = PartitionedRecords::default();

    for (index, row) in csv_reader.deserialize::<RawRecordRow>().enumerate() {
        let row = row?;

        // Line 1 is the header
        let line = index + 2;
        let kind = RecordKind::try_from(row.kind.as_str()).map_err(|_| {
            RecordLoaderError::UnknownRecordType {
                line,
                value: row.kind.clone(),
            }
        })?;

        let record = SourceRecord {
            id: row.id,
            kind,
            name_or_title: row.name_or_title,
            text: row.text,
        };

        match kind {
            RecordKind::Candidate => records.candidates.push(record),
            RecordKind::Job => records.jobs.push(record),
        }
    }

    Ok(records)
}

#[derive(thiserror::Error)]
pub enum RecordLoaderError {
    #[error("Could not read records file {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Records file is malformed: {0}")]
    Malformed(#[from] csv::Error),
    #[error("Row at line {line} has an unknown record type: {value}")]
    UnknownRecordType { line: usize, value: String },
}

impl std::fmt::Debug for RecordLoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
