//! Confusion-matrix-derived evaluation metrics.
//!
//! The matrix is square over every class the label encoder knows, indexed
//! `(true, predicted)`. The classification report covers only labels that
//! occur in the true or predicted values; a metric whose denominator is zero
//! is reported as `0.0`.

use thiserror::Error;

use crate::labels::LabelEncoder;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("{truth} true labels but {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },

    #[error("class index {index} out of range for {n_classes} classes")]
    LabelOutOfRange { index: usize, n_classes: usize },
}

/// Counts of (true class, predicted class) pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    n_classes: usize,
    /// Row-major: `counts[t * n_classes + p]`.
    counts: Vec<usize>,
}

/// One off-diagonal confusion cell, labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusedPair<'a> {
    pub true_label: &'a str,
    pub predicted_label: &'a str,
    pub count: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(
        y_true: &[usize],
        y_pred: &[usize],
        n_classes: usize,
    ) -> Result<Self, MetricsError> {
        if y_true.len() != y_pred.len() {
            return Err(MetricsError::LengthMismatch {
                truth: y_true.len(),
                predicted: y_pred.len(),
            });
        }

        let mut counts = vec![0usize; n_classes * n_classes];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            for index in [t, p] {
                if index >= n_classes {
                    return Err(MetricsError::LabelOutOfRange { index, n_classes });
                }
            }
            counts[t * n_classes + p] += 1;
        }
        Ok(Self { n_classes, counts })
    }

    /// Matrix dimension (rows = columns).
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn get(&self, true_class: usize, predicted_class: usize) -> usize {
        self.counts[true_class * self.n_classes + predicted_class]
    }

    /// Counts for one true class, indexed by predicted class.
    pub fn row(&self, true_class: usize) -> &[usize] {
        let start = true_class * self.n_classes;
        &self.counts[start..start + self.n_classes]
    }

    /// Samples whose true class is `true_class`.
    pub fn row_total(&self, true_class: usize) -> usize {
        self.row(true_class).iter().sum()
    }

    /// Samples predicted as `predicted_class`.
    pub fn column_total(&self, predicted_class: usize) -> usize {
        (0..self.n_classes)
            .map(|t| self.get(t, predicted_class))
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Sum of the diagonal.
    pub fn correct(&self) -> usize {
        (0..self.n_classes).map(|i| self.get(i, i)).sum()
    }

    /// Nonzero off-diagonal cells, most frequent first.
    ///
    /// Equal counts keep row-major order. Cells whose class index has no
    /// label in `encoder` are left out.
    pub fn confused_pairs<'a>(&self, encoder: &'a LabelEncoder) -> Vec<ConfusedPair<'a>> {
        let mut pairs = Vec::new();
        for t in 0..self.n_classes {
            let Some(true_label) = encoder.label(t) else {
                continue;
            };
            for p in 0..self.n_classes {
                let count = self.get(t, p);
                if t == p || count == 0 {
                    continue;
                }
                if let Some(predicted_label) = encoder.label(p) {
                    pairs.push(ConfusedPair {
                        true_label,
                        predicted_label,
                        count,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| b.count.cmp(&a.count));
        pairs
    }
}

/// Per-label precision, recall, F1 and support.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true samples of this label.
    pub support: usize,
}

/// Averages over the labels of a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Labels present in truth or predictions, in encoder order.
    pub labels: Vec<LabelMetrics>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
}

impl ClassificationReport {
    /// Build the report from a confusion matrix whose axes follow `encoder`.
    pub fn from_confusion(cm: &ConfusionMatrix, encoder: &LabelEncoder) -> Self {
        let mut labels = Vec::new();
        for (i, label) in encoder.classes().iter().enumerate().take(cm.n_classes()) {
            let support = cm.row_total(i);
            let predicted = cm.column_total(i);
            if support == 0 && predicted == 0 {
                continue;
            }
            let tp = cm.get(i, i);
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            labels.push(LabelMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            });
        }

        let total = cm.total();
        let accuracy = ratio(cm.correct(), total);
        let macro_avg = average(&labels, |_| 1.0, total);
        let weighted_avg = average(&labels, |m| m.support as f64, total);

        Self {
            labels,
            accuracy,
            macro_avg,
            weighted_avg,
        }
    }

    /// Metrics for one label, if it appears in the report.
    pub fn get(&self, label: &str) -> Option<&LabelMetrics> {
        self.labels.iter().find(|m| m.label == label)
    }

    /// Labels with precision strictly below `threshold`, in encoder order.
    pub fn low_precision(&self, threshold: f64) -> Vec<&LabelMetrics> {
        self.labels
            .iter()
            .filter(|m| m.precision < threshold)
            .collect()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn average(
    labels: &[LabelMetrics],
    weight: impl Fn(&LabelMetrics) -> f64,
    support: usize,
) -> Averages {
    let total_weight: f64 = labels.iter().map(&weight).sum();
    let mean = |f: fn(&LabelMetrics) -> f64| {
        if total_weight > 0.0 {
            labels.iter().map(|m| f(m) * weight(m)).sum::<f64>() / total_weight
        } else {
            0.0
        }
    };
    Averages {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
        support,
    }
}
