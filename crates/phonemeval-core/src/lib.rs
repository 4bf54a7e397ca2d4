pub mod sample;
pub mod schema;

pub use sample::{MetadataRow, TestIndices};
pub use schema::embeddings;
