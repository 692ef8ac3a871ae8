use serde::{Deserialize, Serialize};

use crate::domain::entities::record::{RecordKind, SourceRecord};

pub type Embeddings = Vec<f32>;

/// A record ready to be persisted in a vector store collection:
/// its stable id, its embedding and the metadata stored alongside.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordPoint {
    pub id: String,
    pub payload: RecordPayload,
    pub vector: Embeddings,
}

/// Metadata persisted with each point.
///
/// Field names differ by collection: the generic `name_or_title`/`text`
/// columns are renamed on ingest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum RecordPayload {
    Candidate { name: String, resume: String },
    Job { title: String, description: String },
}

impl RecordPayload {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordPayload::Candidate { .. } => RecordKind::Candidate,
            RecordPayload::Job { .. } => RecordKind::Job,
        }
    }

    /// Display label: candidate name or job title
    pub fn label(&self) -> &str {
        match self {
            RecordPayload::Candidate { name, .. } => name,
            RecordPayload::Job { title, .. } => title,
        }
    }

    /// Free-form description: resume text or job description
    pub fn text(&self) -> &str {
        match self {
            RecordPayload::Candidate { resume, .. } => resume,
            RecordPayload::Job { description, .. } => description,
        }
    }
}

impl From<&SourceRecord> for RecordPayload {
    fn from(record: &SourceRecord) -> Self {
        match record.kind {
            RecordKind::Candidate => RecordPayload::Candidate {
                name: record.name_or_title.clone(),
                resume: record.text.clone(),
            },
            RecordKind::Job => RecordPayload::Job {
                title: record.name_or_title.clone(),
                description: record.text.clone(),
            },
        }
    }
}

/// One nearest-neighbor hit: the stored metadata and its distance
/// to the query embedding. Smaller distance means more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMatch {
    pub payload: RecordPayload,
    pub distance: f32,
}
