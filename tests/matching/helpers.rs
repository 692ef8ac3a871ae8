use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use candidate_matcher::domain::entities::record_point::{
    Embeddings, RecordMatch, RecordPoint,
};
use candidate_matcher::domain::ports::{
    EmbeddingsError, EmbeddingsProvider, RecordPointRepository, VectorStoreError,
};
use candidate_matcher::handlers::index_records::IndexingContext;

/// CSV matching the reference scenario: 2 candidates and 1 job
pub const SCENARIO_CSV: &str = "id,type,name_or_title,text\n\
    1,candidate,Alice Martin,Senior Python developer with Django experience\n\
    2,candidate,Bruno Costa,Data engineer building Spark pipelines\n\
    3,job,Backend Engineer,Looking for a Django developer for our billing APIs\n";

/// Owns the fakes and the temporary records file; hands out the borrowed
/// context the handlers work with
pub struct TestContext {
    pub data_file: PathBuf,
    pub embeddings: FakeEmbeddingsProvider,
    pub candidates: InMemoryRecordPointRepository,
    pub jobs: InMemoryRecordPointRepository,
}

impl TestContext {
    pub fn with_records(csv: &str) -> Self {
        Self {
            data_file: write_records_file(csv),
            embeddings: FakeEmbeddingsProvider,
            candidates: InMemoryRecordPointRepository::default(),
            jobs: InMemoryRecordPointRepository::default(),
        }
    }

    pub fn context(&self) -> IndexingContext<'_> {
        IndexingContext {
            data_file: &self.data_file,
            embeddings: &self.embeddings,
            candidates: &self.candidates,
            jobs: &self.jobs,
        }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.data_file);
    }
}

/// Writes a records file under the OS temp directory with a unique name
pub fn write_records_file(csv: &str) -> PathBuf {
    let path =
        std::env::temp_dir().join(format!("candidate_matcher_test_{}.csv", Uuid::new_v4()));
    std::fs::write(&path, csv).expect("Failed to write test records file");
    path
}

/// Deterministic stand-in for the sentence-embeddings model: identical
/// texts always map to identical, L2-normalized vectors
pub struct FakeEmbeddingsProvider;

pub fn fake_embedding(text: &str) -> Embeddings {
    let mut vector = [0.0f32; 8];
    for (index, byte) in text.bytes().enumerate() {
        vector[index % 8] += byte as f32 / 255.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }

    vector.to_vec()
}

#[async_trait]
impl EmbeddingsProvider for FakeEmbeddingsProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embeddings>, EmbeddingsError> {
        if let Some(index) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(EmbeddingsError::EmptyText(index));
        }

        Ok(texts.iter().map(|text| fake_embedding(text)).collect())
    }
}

/// Embedding provider whose model always fails, for atomicity tests
pub struct FailingEmbeddingsProvider;

#[async_trait]
impl EmbeddingsProvider for FailingEmbeddingsProvider {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Embeddings>, EmbeddingsError> {
        Err(EmbeddingsError::Model("model exploded".into()))
    }
}

/// In-memory collection computing exact cosine distances
#[derive(Default)]
pub struct InMemoryRecordPointRepository {
    points: Mutex<Vec<RecordPoint>>,
    nb_save_calls: AtomicUsize,
}

impl InMemoryRecordPointRepository {
    pub fn nb_save_calls(&self) -> usize {
        self.nb_save_calls.load(Ordering::SeqCst)
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl RecordPointRepository for InMemoryRecordPointRepository {
    async fn count(&self) -> Result<u64, VectorStoreError> {
        Ok(self.points.lock().unwrap().len() as u64)
    }

    async fn batch_save(&self, points: Vec<RecordPoint>) -> Result<(), VectorStoreError> {
        self.nb_save_calls.fetch_add(1, Ordering::SeqCst);

        let mut stored = self.points.lock().unwrap();

        let mut seen: std::collections::HashSet<String> =
            stored.iter().map(|point| point.id.clone()).collect();
        for point in &points {
            if !seen.insert(point.id.clone()) {
                return Err(VectorStoreError::DuplicateIds(point.id.clone()));
            }
        }

        stored.extend(points);
        Ok(())
    }

    async fn search(
        &self,
        vector: &Embeddings,
        top_k: u64,
    ) -> Result<Vec<RecordMatch>, VectorStoreError> {
        let stored = self.points.lock().unwrap();

        let mut matches: Vec<RecordMatch> = stored
            .iter()
            .map(|point| RecordMatch {
                payload: point.payload.clone(),
                distance: cosine_distance(&point.vector, vector),
            })
            .collect();

        matches.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        matches.truncate(top_k as usize);

        Ok(matches)
    }
}
