//! Pre-trained phoneme classifiers.
//!
//! Two model kinds are supported, both indexed by label-encoder class:
//!
//! - `nearest_centroid`: one centroid per class; a sample is assigned to the
//!   centroid with the highest cosine similarity.
//! - `linear`: one weight row and intercept per class; a sample is assigned
//!   to the class with the highest score `w·x + b`.
//!
//! Ties resolve to the lowest class index.

use arrow::array::{Array, FixedSizeListArray, Float32Array};
use arrow::record_batch::RecordBatch;
use phonemeval_core::embeddings;
use serde::Deserialize;

use crate::ModelError;
use crate::labels::LabelEncoder;

/// An immutable, pre-trained classifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "ClassifierFile")]
pub struct Classifier {
    kind: Kind,
    dim: usize,
}

#[derive(Debug, Clone)]
enum Kind {
    /// Centroids are stored L2-normalised.
    NearestCentroid { centroids: Vec<Vec<f32>> },
    Linear {
        weights: Vec<Vec<f32>>,
        intercept: Vec<f32>,
    },
}

/// On-disk form, tagged by `kind`.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClassifierFile {
    NearestCentroid {
        centroids: Vec<Vec<f32>>,
    },
    Linear {
        weights: Vec<Vec<f32>>,
        intercept: Vec<f32>,
    },
}

impl TryFrom<ClassifierFile> for Classifier {
    type Error = ModelError;

    fn try_from(file: ClassifierFile) -> Result<Self, Self::Error> {
        match file {
            ClassifierFile::NearestCentroid { centroids } => Self::nearest_centroid(centroids),
            ClassifierFile::Linear { weights, intercept } => Self::linear(weights, intercept),
        }
    }
}

impl Classifier {
    /// Build a nearest-centroid classifier from one centroid per class.
    pub fn nearest_centroid(mut centroids: Vec<Vec<f32>>) -> Result<Self, ModelError> {
        let dim = uniform_dim(&centroids, "centroids")?;
        for c in &mut centroids {
            normalize(c);
        }
        Ok(Self {
            kind: Kind::NearestCentroid { centroids },
            dim,
        })
    }

    /// Build a linear classifier from per-class weight rows and intercepts.
    pub fn linear(weights: Vec<Vec<f32>>, intercept: Vec<f32>) -> Result<Self, ModelError> {
        let dim = uniform_dim(&weights, "weights")?;
        if intercept.len() != weights.len() {
            return Err(ModelError::Malformed(format!(
                "{} weight rows but {} intercepts",
                weights.len(),
                intercept.len()
            )));
        }
        Ok(Self {
            kind: Kind::Linear { weights, intercept },
            dim,
        })
    }

    /// Model kind as written in the artifact.
    pub fn kind(&self) -> &'static str {
        match self.kind {
            Kind::NearestCentroid { .. } => "nearest_centroid",
            Kind::Linear { .. } => "linear",
        }
    }

    /// Number of classes the model scores.
    pub fn n_classes(&self) -> usize {
        match &self.kind {
            Kind::NearestCentroid { centroids } => centroids.len(),
            Kind::Linear { weights, .. } => weights.len(),
        }
    }

    /// Feature dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Check the model against the label encoder and dataset it will be used with.
    pub fn ensure_compatible(
        &self,
        encoder: &LabelEncoder,
        feature_dim: usize,
    ) -> Result<(), ModelError> {
        if self.n_classes() != encoder.len() {
            return Err(ModelError::ClassCountMismatch {
                classifier: self.n_classes(),
                encoder: encoder.len(),
            });
        }
        if self.dim != feature_dim {
            return Err(ModelError::FeatureDimMismatch {
                expected: self.dim,
                found: feature_dim,
            });
        }
        Ok(())
    }

    /// Predict the class index of a single feature vector.
    pub fn predict(&self, features: &[f32]) -> usize {
        match &self.kind {
            // Centroids are unit length, so the dot product ranks by cosine.
            Kind::NearestCentroid { centroids } => {
                argmax(centroids.iter().map(|c| dot(c, features)))
            }
            Kind::Linear { weights, intercept } => argmax(
                weights
                    .iter()
                    .zip(intercept)
                    .map(|(w, b)| dot(w, features) + b),
            ),
        }
    }

    /// Predict class indices for a batch of feature vectors.
    pub fn predict_batch<V: AsRef<[f32]>>(&self, rows: &[V]) -> Vec<usize> {
        rows.iter().map(|r| self.predict(r.as_ref())).collect()
    }
}

/// Extract the `embedding` column of a loaded sample batch, one vector per row.
pub fn features_from_batch(batch: &RecordBatch) -> anyhow::Result<Vec<Vec<f32>>> {
    let emb_col = batch
        .column_by_name(embeddings::EMBEDDING)
        .ok_or_else(|| anyhow::anyhow!("missing '{}' column", embeddings::EMBEDDING))?;

    let fsl = emb_col
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| anyhow::anyhow!("embedding column is not FixedSizeList"))?;

    let dim = fsl.value_length() as usize;

    // The underlying values are a single flat Float32Array.
    let flat_values = fsl
        .values()
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| anyhow::anyhow!("embedding values are not Float32"))?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        if fsl.is_null(row) {
            anyhow::bail!("null embedding at row {row}");
        }
        let offset = fsl.value_offset(row) as usize;
        rows.push(flat_values.values()[offset..offset + dim].to_vec());
    }
    Ok(rows)
}

fn uniform_dim(rows: &[Vec<f32>], what: &str) -> Result<usize, ModelError> {
    let first = rows
        .first()
        .ok_or_else(|| ModelError::Malformed(format!("{what} are empty")))?;
    let dim = first.len();
    if dim == 0 {
        return Err(ModelError::Malformed(format!("{what} have zero length")));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        return Err(ModelError::Malformed(format!(
            "{what} row {i} has {} values, expected {dim}",
            row.len()
        )));
    }
    Ok(dim)
}

/// Index of the first maximum.
fn argmax(scores: impl Iterator<Item = f32>) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, s) in scores.enumerate() {
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
