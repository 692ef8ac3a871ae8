use async_trait::async_trait;
use rust_bert::pipelines::sentence_embeddings::{
    SentenceEmbeddingsBuilder, SentenceEmbeddingsModelType,
};
use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
};
use tokio::{sync::oneshot, task};
use tracing::info;

use crate::domain::entities::record_point::Embeddings;
use crate::domain::ports::{EmbeddingsError, EmbeddingsProvider};

/// Message type for the internal channel: input texts and a sender
/// for the resulting embeddings (or the model error)
type RunnerMessage = (
    Vec<String>,
    oneshot::Sender<Result<Vec<Embeddings>, EmbeddingsError>>,
);

/// Generates embeddings with a sentence-embeddings model from Hugging Face.
///
/// Uses all-MiniLM-L6-v2: maps texts to a 384 dimensional dense vector space.
/// For a fixed model version the output is deterministic.
pub struct HuggingFaceEmbeddingsService {
    sender_to_runner: mpsc::SyncSender<RunnerMessage>,
    _thread_handle: JoinHandle<Result<(), EmbeddingsError>>,
}

impl HuggingFaceEmbeddingsService {
    /// Spawns the model runner on a separate thread and returns a handle
    /// to interact with it
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::sync_channel(100);
        let handle = thread::spawn(move || Self::runner(receiver));

        Self {
            _thread_handle: handle,
            sender_to_runner: sender,
        }
    }

    /// The model runner itself
    ///
    /// Model inference is an extensive blocking computation: it must not run
    /// inside a future, so the runner lives on its own sync thread. It stops
    /// once every service handle (hence the channel sender) is dropped.
    #[tracing::instrument(name = "Embeddings runner", skip(receiver))]
    fn runner(receiver: mpsc::Receiver<RunnerMessage>) -> Result<(), EmbeddingsError> {
        let model = SentenceEmbeddingsBuilder::remote(SentenceEmbeddingsModelType::AllMiniLmL6V2)
            .create_model()
            .map_err(|e| EmbeddingsError::Model(e.to_string()))?;
        info!("Embeddings model loaded ✅");

        while let Ok((texts, sender)) = receiver.recv() {
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            let embeddings = model
                .encode(&texts)
                .map_err(|e| EmbeddingsError::Model(e.to_string()));

            // The requester may have given up waiting: nothing to do then
            let _ = sender.send(embeddings);
        }

        Ok(())
    }
}

impl Default for HuggingFaceEmbeddingsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingsProvider for HuggingFaceEmbeddingsService {
    #[tracing::instrument(name = "Generating embeddings", skip(self, texts), fields(nb_texts = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embeddings>, EmbeddingsError> {
        if let Some(index) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(EmbeddingsError::EmptyText(index));
        }

        let (sender, receiver) = oneshot::channel();

        task::block_in_place(|| self.sender_to_runner.send((texts.to_vec(), sender)))
            .map_err(|_| EmbeddingsError::WorkerStopped)?;

        let embeddings = receiver
            .await
            .map_err(|_| EmbeddingsError::WorkerStopped)??;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingsError::BatchSizeMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}
