use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("label encoder has no classes")]
    EmptyClasses,

    #[error("label encoder classes must be sorted and unique (at '{0}')")]
    UnsortedClasses(String),

    #[error("label '{0}' is not known to the label encoder")]
    UnknownLabel(String),

    #[error("malformed classifier: {0}")]
    Malformed(String),

    #[error("classifier has {classifier} classes but label encoder has {encoder}")]
    ClassCountMismatch { classifier: usize, encoder: usize },

    #[error("classifier expects {expected}-dim features, dataset has {found}")]
    FeatureDimMismatch { expected: usize, found: usize },
}
