pub mod huggingface_embedding;
pub mod record_loader;
pub mod similarity;
