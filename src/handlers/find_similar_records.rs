use std::cmp::Ordering;

use tracing::info;

use crate::domain::entities::record::RecordKind;
use crate::domain::entities::record_point::RecordMatch;
use crate::domain::ports::{
    EmbeddingsError, EmbeddingsProvider, RecordPointRepository, VectorStoreError,
};
use crate::handlers::index_records::{ensure_indexed, EnsureIndexedError, IndexingContext};
use crate::helper::error_chain_fmt;

/// Returns the stored records of `target` kind closest to `query_text`.
///
/// If the target collection is empty the indexing pipeline runs first, so
/// the first ever query pays the full indexing latency.
///
/// The result holds at most `top_k` matches, and never more than the
/// collection currently has, ordered by non-decreasing distance.
#[tracing::instrument(name = "Finding similar records", skip_all, fields(target = target.as_str(), top_k))]
pub async fn find_similar_records(
    ctx: &IndexingContext<'_>,
    target: RecordKind,
    query_text: &str,
    top_k: usize,
) -> Result<Vec<RecordMatch>, FindSimilarRecordsError> {
    if top_k < 1 {
        return Err(FindSimilarRecordsError::InvalidTopK(top_k));
    }
    if query_text.trim().is_empty() {
        return Err(FindSimilarRecordsError::EmptyQueryText);
    }

    let repository = match target {
        RecordKind::Candidate => ctx.candidates,
        RecordKind::Job => ctx.jobs,
    };

    // Lazy bootstrap: an explicit existence check, not a hidden init flag
    if repository.count().await? == 0 {
        info!("Target collection is empty, indexing first");
        ensure_indexed(ctx).await?;
    }

    let query_vector = ctx.embeddings.embed_one(query_text).await?;

    let mut matches = repository.search(&query_vector, top_k as u64).await?;

    // The store already ranks its results, but the ascending-distance
    // contract is ours to uphold whatever the configured metric
    matches.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });

    info!(nb_matches = matches.len(), "Found similar records");

    Ok(matches)
}

#[derive(thiserror::Error)]
pub enum FindSimilarRecordsError {
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),
    #[error("The query text is empty")]
    EmptyQueryText,
    #[error(transparent)]
    EnsureIndexedError(#[from] EnsureIndexedError),
    #[error(transparent)]
    EmbeddingsError(#[from] EmbeddingsError),
    #[error(transparent)]
    VectorStoreError(#[from] VectorStoreError),
}

impl std::fmt::Debug for FindSimilarRecordsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
