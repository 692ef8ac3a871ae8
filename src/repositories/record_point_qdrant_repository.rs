use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use qdrant_client::{
    prelude::QdrantClient,
    qdrant::{
        self, value::Kind, vectors_config::Config, CountPoints, CreateCollection, Distance,
        PointId, PointStruct, SearchPoints, VectorParams, VectorsConfig,
    },
};
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::record_point::{Embeddings, RecordMatch, RecordPayload, RecordPoint};
use crate::domain::ports::{RecordPointRepository, VectorStoreError};
use crate::domain::services::similarity::DistanceMetric;

/// Repository for one collection of record points persisted in Qdrant
pub struct RecordPointQdrantRepository {
    client: QdrantClient,
    collection_name: String,
    metric: DistanceMetric,
    vector_size: u64,
}

impl RecordPointQdrantRepository {
    /// Creates the collection if it does not exist yet and returns the repository.
    ///
    /// Collection creation is made idempotent: an "already exists" error from
    /// Qdrant is not a failure, the existing collection is reused as-is.
    #[tracing::instrument(
        name = "Initializing Qdrant and the associated collection",
        skip(client)
    )]
    pub async fn try_new(
        client: QdrantClient,
        collection_name: &str,
        metric: DistanceMetric,
        vector_size: u64,
    ) -> Result<Self, VectorStoreError> {
        match client
            .create_collection(&CreateCollection {
                collection_name: collection_name.to_string(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: vector_size,
                        distance: qdrant_distance(metric) as i32,
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
        {
            Ok(_) => info!("Created collection {}", collection_name),
            Err(error) => {
                // Qdrant client only returns anyhow errors for now
                if !error.to_string().contains("already exists") {
                    return Err(VectorStoreError::Store(error.to_string()));
                }
            }
        };

        Ok(Self {
            client,
            collection_name: collection_name.to_string(),
            metric,
            vector_size,
        })
    }
}

#[async_trait]
impl RecordPointRepository for RecordPointQdrantRepository {
    #[tracing::instrument(name = "Counting points in Qdrant collection", skip(self), fields(collection = %self.collection_name))]
    async fn count(&self) -> Result<u64, VectorStoreError> {
        let response = self
            .client
            .count(&CountPoints {
                collection_name: self.collection_name.clone(),
                exact: Some(true),
                ..Default::default()
            })
            .await
            .map_err(|e| VectorStoreError::Store(e.to_string()))?;

        Ok(response.result.map(|result| result.count).unwrap_or(0))
    }

    #[tracing::instrument(name = "Saving record points to Qdrant", skip(self, points), fields(collection = %self.collection_name, nb_points = points.len()))]
    async fn batch_save(&self, points: Vec<RecordPoint>) -> Result<(), VectorStoreError> {
        let mut seen_ids = HashSet::new();
        for point in &points {
            if !seen_ids.insert(point.id.clone()) {
                return Err(VectorStoreError::DuplicateIds(point.id.clone()));
            }
            if point.vector.len() as u64 != self.vector_size {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: self.vector_size,
                    actual: point.vector.len() as u64,
                });
            }
        }

        // Blocking upsert: points must be visible to `count` and `search`
        // as soon as this returns
        self.client
            .upsert_points_blocking(
                &self.collection_name,
                points.into_iter().map(PointStruct::from).collect(),
                None,
            )
            .await
            .map_err(|e| VectorStoreError::Store(e.to_string()))?;

        info!("Saved record points");
        Ok(())
    }

    #[tracing::instrument(name = "Searching nearest points in Qdrant", skip(self, vector), fields(collection = %self.collection_name))]
    async fn search(
        &self,
        vector: &Embeddings,
        top_k: u64,
    ) -> Result<Vec<RecordMatch>, VectorStoreError> {
        let response = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection_name.clone(),
                vector: vector.clone(),
                limit: top_k,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| VectorStoreError::Store(e.to_string()))?;

        response
            .result
            .into_iter()
            .map(|scored| {
                let payload = RecordPayload::try_from(&scored.payload)?;

                Ok(RecordMatch {
                    payload,
                    distance: self.metric.distance_from_score(scored.score),
                })
            })
            .collect()
    }
}

fn qdrant_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Euclid => Distance::Euclid,
        DistanceMetric::Dot => Distance::Dot,
    }
}

/// Qdrant only accepts unsigned integers or UUIDs as point ids.
/// Numeric record ids are used directly; any other id is mapped to a
/// deterministic UUIDv5 so it stays stable across runs.
fn point_id_for(record_id: &str) -> PointId {
    match record_id.parse::<u64>() {
        Ok(numeric_id) => PointId::from(numeric_id),
        Err(_) => PointId::from(
            Uuid::new_v5(&Uuid::NAMESPACE_OID, record_id.as_bytes()).to_string(),
        ),
    }
}

impl From<RecordPoint> for PointStruct {
    fn from(point: RecordPoint) -> Self {
        Self {
            id: Some(point_id_for(&point.id)),
            vectors: Some(point.vector.into()),
            payload: point.payload.into(),
        }
    }
}

impl From<RecordPayload> for HashMap<String, qdrant::Value> {
    fn from(payload: RecordPayload) -> Self {
        match payload {
            RecordPayload::Candidate { name, resume } => HashMap::from([
                ("name".into(), qdrant::Value::from(name)),
                ("resume".into(), qdrant::Value::from(resume)),
            ]),
            RecordPayload::Job { title, description } => HashMap::from([
                ("title".into(), qdrant::Value::from(title)),
                ("description".into(), qdrant::Value::from(description)),
            ]),
        }
    }
}

impl TryFrom<&HashMap<String, qdrant::Value>> for RecordPayload {
    type Error = VectorStoreError;

    fn try_from(payload: &HashMap<String, qdrant::Value>) -> Result<Self, Self::Error> {
        if payload.contains_key("name") {
            Ok(RecordPayload::Candidate {
                name: string_field(payload, "name")?,
                resume: string_field(payload, "resume")?,
            })
        } else if payload.contains_key("title") {
            Ok(RecordPayload::Job {
                title: string_field(payload, "title")?,
                description: string_field(payload, "description")?,
            })
        } else {
            Err(VectorStoreError::MalformedPayload(
                "neither a candidate nor a job payload".into(),
            ))
        }
    }
}

fn string_field(
    payload: &HashMap<String, qdrant::Value>,
    field: &str,
) -> Result<String, VectorStoreError> {
    match payload.get(field).and_then(|value| value.kind.as_ref()) {
        Some(Kind::StringValue(value)) => Ok(value.clone()),
        _ => Err(VectorStoreError::MalformedPayload(format!(
            "missing or non-string field {}",
            field
        ))),
    }
}
