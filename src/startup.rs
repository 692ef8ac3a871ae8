use std::path::PathBuf;

use qdrant_client::prelude::{QdrantClient, QdrantClientConfig};

use crate::{
    configuration::{QdrantSettings, Settings},
    domain::{
        entities::{record::RecordKind, record_point::RecordMatch},
        ports::VectorStoreError,
        services::{huggingface_embedding::HuggingFaceEmbeddingsService, similarity::DistanceMetric},
    },
    handlers::{
        find_similar_records::{find_similar_records, FindSimilarRecordsError},
        index_records::{ensure_indexed, EnsureIndexedError, IndexingContext, IndexingReport},
    },
    repositories::record_point_qdrant_repository::RecordPointQdrantRepository,
};

/// Holds the wired collaborators: the embeddings model runner and one
/// repository per collection. Built once, then used per request.
pub struct Application {
    data_file: PathBuf,
    distance_metric: DistanceMetric,
    embeddings_service: HuggingFaceEmbeddingsService,
    candidates_repository: RecordPointQdrantRepository,
    jobs_repository: RecordPointQdrantRepository,
}

impl Application {
    #[tracing::instrument(name = "Building application")]
    pub async fn build(settings: Settings) -> Result<Self, ApplicationError> {
        let distance_metric = DistanceMetric::try_from(
            settings.qdrant.collection_distance.as_str(),
        )
        .map_err(ApplicationError::InvalidDistanceMetric)?;

        // The qdrant client is not shareable: one client per collection
        let candidates_repository = RecordPointQdrantRepository::try_new(
            get_qdrant_client(&settings.qdrant)?,
            &settings.qdrant.candidates_collection,
            distance_metric,
            settings.qdrant.collection_vector_size,
        )
        .await?;

        let jobs_repository = RecordPointQdrantRepository::try_new(
            get_qdrant_client(&settings.qdrant)?,
            &settings.qdrant.jobs_collection,
            distance_metric,
            settings.qdrant.collection_vector_size,
        )
        .await?;

        // The model type could come from the configuration
        let embeddings_service = HuggingFaceEmbeddingsService::new();

        Ok(Self {
            data_file: settings.application.data_file,
            distance_metric,
            embeddings_service,
            candidates_repository,
            jobs_repository,
        })
    }

    /// Populates both collections from the source table unless already done
    pub async fn ensure_indexed(&self) -> Result<IndexingReport, EnsureIndexedError> {
        ensure_indexed(&self.indexing_context()).await
    }

    /// Top-K nearest records of `target` kind for a free-text query
    pub async fn find_similar(
        &self,
        target: RecordKind,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RecordMatch>, FindSimilarRecordsError> {
        find_similar_records(&self.indexing_context(), target, query_text, top_k).await
    }

    /// The distance function both collections were created with
    pub fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric
    }

    fn indexing_context(&self) -> IndexingContext<'_> {
        IndexingContext {
            data_file: &self.data_file,
            embeddings: &self.embeddings_service,
            candidates: &self.candidates_repository,
            jobs: &self.jobs_repository,
        }
    }
}

/// Sets up a client to Qdrant
pub fn get_qdrant_client(config: &QdrantSettings) -> Result<QdrantClient, ApplicationError> {
    let qdrant_config = QdrantClientConfig::from_url(&config.get_grpc_base_url());
    QdrantClient::new(Some(qdrant_config)).map_err(|e| ApplicationError::QdrantError(e.to_string()))
}

#[derive(thiserror::Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Error from Qdrant: {0}")]
    QdrantError(String),
    #[error("Invalid collection distance in configuration: {0}")]
    InvalidDistanceMetric(String),
    #[error(transparent)]
    VectorStoreError(#[from] VectorStoreError),
}
