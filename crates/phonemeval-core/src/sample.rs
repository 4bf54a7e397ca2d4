//! Plain data types exchanged between the loader, the model layer and the CLI.

use serde::{Deserialize, Serialize};

/// One row of `phoneme_embeddings/metadata.csv`.
///
/// Extra columns in the CSV are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    /// Vector file name, relative to the embeddings directory.
    pub embedding_filename: String,
    pub phoneme: String,
}

/// Test partition persisted next to a trained model.
///
/// Row indices refer to the order of samples produced by the embedding
/// loader. When present, they replace the seeded re-derivation of the split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestIndices {
    pub test: Vec<usize>,
}
