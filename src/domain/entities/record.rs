use serde::{Deserialize, Serialize};

/// Discriminates the two kinds of records held in the source table,
/// each indexed into its own vector store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Candidate,
    Job,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Candidate => "candidate",
            RecordKind::Job => "job",
        }
    }
}

impl TryFrom<&str> for RecordKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "candidate" => Ok(Self::Candidate),
            "job" => Ok(Self::Job),
            other => Err(format!(
                "{} is not a supported record type. Use either `candidate` or `job`.",
                other
            )),
        }
    }
}

/// One row of the source table: a candidate resume or a job posting.
///
/// `id` is unique within its kind and stable across runs.
/// Records are never mutated after loading.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceRecord {
    pub id: String,
    pub kind: RecordKind,
    pub name_or_title: String,
    pub text: String,
}
