//! Evaluation layer: label encoding, classifier inference, stratified
//! splitting and confusion metrics.

mod error;
pub use error::ModelError;

pub mod classifier;
pub mod labels;
pub mod metrics;
pub mod model;
pub mod split;

pub use classifier::{Classifier, features_from_batch};
pub use labels::{LabelEncoder, labels_from_batch};
pub use metrics::{
    Averages, ClassificationReport, ConfusedPair, ConfusionMatrix, LabelMetrics, MetricsError,
};
pub use split::{Split, SplitError, split_from_test_indices, stratified_split};
