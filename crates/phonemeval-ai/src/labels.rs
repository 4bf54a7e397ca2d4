//! Phoneme label encoding.
//!
//! The encoder is a bijection between class indices and phoneme strings.
//! Classes are stored sorted and unique, so index order is lexical order and
//! lookups are a binary search.

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use phonemeval_core::embeddings;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Maps phoneme strings to contiguous class indices and back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderFile", into = "EncoderFile")]
pub struct LabelEncoder {
    classes: Vec<String>,
}

/// On-disk form: `{"classes": ["AA", "AE", ...]}`.
#[derive(Serialize, Deserialize)]
struct EncoderFile {
    classes: Vec<String>,
}

impl TryFrom<EncoderFile> for LabelEncoder {
    type Error = ModelError;

    fn try_from(file: EncoderFile) -> Result<Self, Self::Error> {
        Self::new(file.classes)
    }
}

impl From<LabelEncoder> for EncoderFile {
    fn from(encoder: LabelEncoder) -> Self {
        EncoderFile {
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    /// Build an encoder from classes already in index order.
    ///
    /// Classes must be non-empty, strictly ascending and therefore unique.
    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        if classes.is_empty() {
            return Err(ModelError::EmptyClasses);
        }
        if let Some(w) = classes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ModelError::UnsortedClasses(w[1].clone()));
        }
        Ok(Self { classes })
    }

    /// All classes in index order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class index of `label`, if known.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    /// Label string for a class index.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Encode labels to class indices. Any unknown label is an error.
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, ModelError> {
        labels
            .iter()
            .map(|l| {
                let l = l.as_ref();
                self.index_of(l)
                    .ok_or_else(|| ModelError::UnknownLabel(l.to_string()))
            })
            .collect()
    }

    /// Decode class indices back to label strings.
    ///
    /// Returns `None` if any index is out of range.
    pub fn inverse_transform(&self, indices: &[usize]) -> Option<Vec<&str>> {
        indices.iter().map(|&i| self.label(i)).collect()
    }
}

/// Extract the `phoneme` column of a loaded sample batch, in row order.
pub fn labels_from_batch(batch: &RecordBatch) -> anyhow::Result<Vec<String>> {
    let col = batch
        .column_by_name(embeddings::PHONEME)
        .ok_or_else(|| anyhow::anyhow!("missing '{}' column", embeddings::PHONEME))?;

    (0..batch.num_rows())
        .map(|row| {
            get_string(col.as_ref(), row)
                .ok_or_else(|| anyhow::anyhow!("null or non-string phoneme at row {row}"))
        })
        .collect()
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn encoder(classes: &[&str]) -> LabelEncoder {
        LabelEncoder::new(classes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn transform_maps_to_sorted_indices() {
        let le = encoder(&["AA", "EH", "IY", "UW"]);
        assert_eq!(le.transform(&["IY", "AA", "UW"]).unwrap(), vec![2, 0, 3]);
    }

    #[test]
    fn transform_unknown_label_errors() {
        let le = encoder(&["AA", "IY"]);
        let err = le.transform(&["AA", "ZH"]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownLabel(ref l) if l == "ZH"));
    }

    #[test]
    fn inverse_transform_round_trips_indices() {
        let le = encoder(&["AA", "IY", "UW"]);
        assert_eq!(le.inverse_transform(&[2, 0]).unwrap(), vec!["UW", "AA"]);
        assert!(le.inverse_transform(&[3]).is_none());
    }

    #[test]
    fn new_rejects_empty() {
        assert!(matches!(LabelEncoder::new(vec![]), Err(ModelError::EmptyClasses)));
    }

    #[test]
    fn new_rejects_unsorted_or_duplicate() {
        let unsorted = LabelEncoder::new(vec!["IY".into(), "AA".into()]);
        assert!(matches!(unsorted, Err(ModelError::UnsortedClasses(ref c)) if c == "AA"));

        let dup = LabelEncoder::new(vec!["AA".into(), "AA".into()]);
        assert!(matches!(dup, Err(ModelError::UnsortedClasses(_))));
    }

    #[test]
    fn deserialize_validates_classes() {
        let ok: LabelEncoder = serde_json::from_str(r#"{"classes": ["AA", "B"]}"#).unwrap();
        assert_eq!(ok.len(), 2);

        let bad = serde_json::from_str::<LabelEncoder>(r#"{"classes": ["B", "AA"]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn labels_from_batch_reads_utf8_and_large_utf8() {
        let schema = Schema::new(vec![Field::new(embeddings::PHONEME, DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["AA", "IY"]))],
        )
        .unwrap();
        assert_eq!(labels_from_batch(&batch).unwrap(), vec!["AA", "IY"]);

        let schema = Schema::new(vec![Field::new(
            embeddings::PHONEME,
            DataType::LargeUtf8,
            false,
        )]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(LargeStringArray::from(vec!["UW"]))],
        )
        .unwrap();
        assert_eq!(labels_from_batch(&batch).unwrap(), vec!["UW"]);
    }

    #[test]
    fn labels_from_batch_missing_column_errors() {
        let schema = Schema::new(vec![Field::new("other", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["x"]))],
        )
        .unwrap();
        assert!(labels_from_batch(&batch).is_err());
    }
}
