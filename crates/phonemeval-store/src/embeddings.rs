//! Loads `metadata.csv` and the vector file each row references.
//!
//! Rows whose vector file does not exist are skipped without error. The skip
//! is logged per row at `debug` and summarised once at `warn`, and the count
//! is carried in [`EmbeddingSet::skipped`].

use std::path::Path;
use std::sync::Arc;

use arrow::array::{FixedSizeListBuilder, Float32Builder, StringBuilder};
use arrow::record_batch::RecordBatch;
use phonemeval_core::{MetadataRow, embeddings};
use tracing::{debug, info, warn};

use crate::StoreError;
use crate::npy;

/// Loaded samples, one row per metadata entry with an existing vector file.
///
/// Columns follow [`embeddings::sample_schema`] and keep metadata order.
pub struct EmbeddingSet {
    pub batch: RecordBatch,
    /// Vector length shared by every sample (0 when nothing loaded).
    pub dim: usize,
    /// Metadata rows dropped because their vector file is missing.
    pub skipped: usize,
}

impl EmbeddingSet {
    /// Number of loaded samples.
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }
}

/// Read every row of a metadata CSV.
///
/// Requires `embedding_filename` and `phoneme` columns; others are ignored.
pub fn read_metadata(path: &Path) -> Result<Vec<MetadataRow>, StoreError> {
    if !path.exists() {
        return Err(StoreError::MetadataNotFound(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<MetadataRow>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Load embeddings listed in `metadata_path`, resolving vector file names
/// against `embeddings_dir`.
pub fn load_embeddings(
    embeddings_dir: &Path,
    metadata_path: &Path,
) -> Result<EmbeddingSet, StoreError> {
    let rows = read_metadata(metadata_path)?;
    let total = rows.len();

    let mut loaded: Vec<(MetadataRow, Vec<f32>)> = Vec::with_capacity(total);
    let mut skipped = 0usize;
    let mut dim: Option<usize> = None;

    for row in rows {
        let path = embeddings_dir.join(&row.embedding_filename);
        if !path.exists() {
            debug!(file = %path.display(), phoneme = %row.phoneme, "vector file missing, skipping row");
            skipped += 1;
            continue;
        }

        let vector = npy::read_vector(&path)?;
        let expected = *dim.get_or_insert(vector.len());
        if expected != vector.len() {
            return Err(StoreError::DimensionMismatch {
                path,
                expected,
                found: vector.len(),
            });
        }
        loaded.push((row, vector));
    }

    if skipped > 0 {
        warn!(skipped, total, "metadata rows skipped: vector file missing");
    }

    let dim = dim.unwrap_or(0);
    let batch = build_batch(&loaded, dim)?;
    info!(samples = batch.num_rows(), dim, "loaded phoneme embeddings");

    Ok(EmbeddingSet {
        batch,
        dim,
        skipped,
    })
}

fn build_batch(samples: &[(MetadataRow, Vec<f32>)], dim: usize) -> Result<RecordBatch, StoreError> {
    let list_size = i32::try_from(dim)
        .map_err(|_| StoreError::Other(format!("embedding dimension {dim} too large")))?;

    let mut filenames = StringBuilder::new();
    let mut phonemes = StringBuilder::new();
    let mut vectors = FixedSizeListBuilder::new(Float32Builder::new(), list_size);

    for (row, vector) in samples {
        filenames.append_value(&row.embedding_filename);
        phonemes.append_value(&row.phoneme);
        vectors.values().append_slice(vector);
        vectors.append(true);
    }

    let schema = Arc::new(embeddings::sample_schema(list_size));
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(filenames.finish()),
            Arc::new(phonemes.finish()),
            Arc::new(vectors.finish()),
        ],
    )?)
}
