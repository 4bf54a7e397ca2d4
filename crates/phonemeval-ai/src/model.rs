//! Loading of trained model artifacts from disk.
//!
//! Every artifact is JSON. A missing or unparsable artifact is an error;
//! there is no fallback.

use std::path::Path;

use phonemeval_core::TestIndices;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::ModelError;
use crate::classifier::Classifier;
use crate::labels::LabelEncoder;

pub const DEFAULT_CLASSIFIER_PATH: &str = "dist/phoneme_classifier.json";
pub const DEFAULT_LABEL_ENCODER_PATH: &str = "dist/label_encoder.json";

/// Load a trained classifier.
pub fn load_classifier(path: &Path) -> Result<Classifier, ModelError> {
    let clf: Classifier = read_json(path)?;
    info!(
        path = %path.display(),
        kind = clf.kind(),
        classes = clf.n_classes(),
        dim = clf.dim(),
        "loaded classifier"
    );
    Ok(clf)
}

/// Load the label encoder that was fitted alongside the classifier.
pub fn load_label_encoder(path: &Path) -> Result<LabelEncoder, ModelError> {
    let encoder: LabelEncoder = read_json(path)?;
    info!(path = %path.display(), classes = encoder.len(), "loaded label encoder");
    Ok(encoder)
}

/// Load a test partition persisted by the training run.
pub fn load_test_indices(path: &Path) -> Result<TestIndices, ModelError> {
    let indices: TestIndices = read_json(path)?;
    info!(path = %path.display(), test = indices.test.len(), "loaded persisted test indices");
    Ok(indices)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}
