use async_trait::async_trait;

use crate::domain::entities::record_point::{Embeddings, RecordMatch, RecordPoint};
use crate::helper::error_chain_fmt;

/// Maps texts to fixed-dimension dense vectors.
///
/// For a fixed model version the mapping is deterministic: identical texts
/// produce identical embeddings.
#[async_trait]
pub trait EmbeddingsProvider: Send + Sync {
    /// Encodes a batch of texts, one embedding per input text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embeddings>, EmbeddingsError>;

    async fn embed_one(&self, text: &str) -> Result<Embeddings, EmbeddingsError> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;

        embeddings
            .pop()
            .ok_or(EmbeddingsError::BatchSizeMismatch {
                expected: 1,
                actual: 0,
            })
    }
}

#[derive(thiserror::Error)]
pub enum EmbeddingsError {
    #[error("Text at index {0} of the batch is empty")]
    EmptyText(usize),
    #[error("Embeddings model error: {0}")]
    Model(String),
    #[error("Expected {expected} embeddings from the model, got {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },
    #[error("The embeddings worker thread is no longer running")]
    WorkerStopped,
}

impl std::fmt::Debug for EmbeddingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// One named, persistent collection of record points supporting
/// batched upsert and nearest-neighbor search.
#[async_trait]
pub trait RecordPointRepository: Send + Sync {
    /// Number of points currently persisted in the collection
    async fn count(&self) -> Result<u64, VectorStoreError>;

    /// Persists the whole batch. Ids must be unique within the collection;
    /// a batch that would violate this is rejected without persisting anything.
    async fn batch_save(&self, points: Vec<RecordPoint>) -> Result<(), VectorStoreError>;

    /// The `top_k` stored points closest to `vector`, with their payloads,
    /// ordered by non-decreasing distance.
    async fn search(
        &self,
        vector: &Embeddings,
        top_k: u64,
    ) -> Result<Vec<RecordMatch>, VectorStoreError>;
}

#[derive(thiserror::Error)]
pub enum VectorStoreError {
    #[error("Error from the vector store: {0}")]
    Store(String),
    #[error("Batch contains duplicate record id {0}")]
    DuplicateIds(String),
    #[error("Expected vectors of dimension {expected}, got {actual}")]
    DimensionMismatch { expected: u64, actual: u64 },
    #[error("Stored payload could not be read back: {0}")]
    MalformedPayload(String),
}

impl std::fmt::Debug for VectorStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
