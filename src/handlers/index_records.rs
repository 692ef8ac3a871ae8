use std::path::Path;

use tracing::info;

use crate::domain::entities::record::SourceRecord;
use crate::domain::entities::record_point::{RecordPayload, RecordPoint};
use crate::domain::ports::{
    EmbeddingsError, EmbeddingsProvider, RecordPointRepository, VectorStoreError,
};
use crate::domain::services::record_loader::{load_records, RecordLoaderError};
use crate::helper::error_chain_fmt;

/// Everything the indexing pipeline needs: the records source and the
/// two collaborators, passed explicitly so tests can substitute fakes
pub struct IndexingContext<'a> {
    pub data_file: &'a Path,
    pub embeddings: &'a dyn EmbeddingsProvider,
    pub candidates: &'a dyn RecordPointRepository,
    pub jobs: &'a dyn RecordPointRepository,
}

/// How many records each collection was populated with. All zeros when
/// indexing was skipped because the collections were already populated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexingReport {
    pub candidates_indexed: usize,
    pub jobs_indexed: usize,
}

/// Populates both collections from the source table, once.
///
/// A collection that already holds at least one point is left untouched:
/// the guard is a coarse existence check, not a per-id diff. Adding new
/// records after the first run requires clearing the collection.
#[tracing::instrument(name = "Indexing records into the vector store", skip_all)]
pub async fn ensure_indexed(
    ctx: &IndexingContext<'_>,
) -> Result<IndexingReport, EnsureIndexedError> {
    let candidates_count = ctx.candidates.count().await?;
    let jobs_count = ctx.jobs.count().await?;

    if candidates_count > 0 && jobs_count > 0 {
        info!("Both collections already populated, skipping indexing");
        return Ok(IndexingReport::default());
    }

    let records = load_records(ctx.data_file)?;

    let candidates_indexed = if candidates_count == 0 {
        index_collection(&records.candidates, ctx.embeddings, ctx.candidates).await?
    } else {
        0
    };

    let jobs_indexed = if jobs_count == 0 {
        index_collection(&records.jobs, ctx.embeddings, ctx.jobs).await?
    } else {
        0
    };

    info!(candidates_indexed, jobs_indexed, "Indexing done");

    Ok(IndexingReport {
        candidates_indexed,
        jobs_indexed,
    })
}

/// Embeds and persists all records of one kind as a single batch.
///
/// All embeddings are computed before any upsert: a model failure leaves
/// the collection untouched, there is no partially indexed state.
async fn index_collection(
    records: &[SourceRecord],
    embeddings: &dyn EmbeddingsProvider,
    repository: &dyn RecordPointRepository,
) -> Result<usize, EnsureIndexedError> {
    if records.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = records.iter().map(|record| record.text.clone()).collect();
    let vectors = embeddings.embed_batch(&texts).await?;

    let points = records
        .iter()
        .zip(vectors)
        .map(|(record, vector)| RecordPoint {
            id: record.id.clone(),
            payload: RecordPayload::from(record),
            vector,
        })
        .collect();

    repository.batch_save(points).await?;

    Ok(records.len())
}

#[derive(thiserror::Error)]
pub enum EnsureIndexedError {
    #[error(transparent)]
    RecordLoaderError(#[from] RecordLoaderError),
    #[error(transparent)]
    EmbeddingsError(#[from] EmbeddingsError),
    #[error(transparent)]
    VectorStoreError(#[from] VectorStoreError),
}

impl std::fmt::Debug for EnsureIndexedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
