//! Embedding loader: metadata CSV plus per-sample `.npy` vectors into Arrow batches.

mod error;
pub use error::StoreError;

pub mod embeddings;
pub mod npy;

pub use embeddings::{EmbeddingSet, load_embeddings, read_metadata};
