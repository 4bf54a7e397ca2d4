/// Arrow schema definitions for loaded phoneme embeddings.
pub mod embeddings {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// Vector file name as written in `metadata.csv`.
    pub const FILENAME: &str = "embedding_filename";
    /// Phoneme label (classification target).
    pub const PHONEME: &str = "phoneme";
    /// Fixed-length feature vector.
    pub const EMBEDDING: &str = "embedding";

    /// Data type of the `embedding` column for vectors of length `dim`.
    pub fn embedding_type(dim: i32) -> DataType {
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim)
    }

    /// Schema for one loaded sample per row.
    pub fn sample_schema(dim: i32) -> Schema {
        Schema::new(vec![
            Field::new(FILENAME, DataType::Utf8, false),
            Field::new(PHONEME, DataType::Utf8, false),
            Field::new(EMBEDDING, embedding_type(dim), false),
        ])
    }
}
