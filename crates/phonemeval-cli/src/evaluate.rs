//! Evaluation pipeline: load embeddings and models, split, predict, score.

use std::path::PathBuf;

use anyhow::Context;
use phonemeval_ai::{
    ClassificationReport, ConfusedPair, ConfusionMatrix, LabelEncoder, Split, features_from_batch,
    labels_from_batch, model, split_from_test_indices, stratified_split,
};
use tracing::debug;

/// Inputs of one evaluation run.
pub struct EvalOptions {
    pub embeddings_dir: PathBuf,
    pub metadata: PathBuf,
    pub classifier: PathBuf,
    pub label_encoder: PathBuf,
    /// Persisted test partition; when absent the split is re-derived from `seed`.
    pub test_indices: Option<PathBuf>,
    pub seed: u64,
    pub test_ratio: f64,
}

#[derive(Debug)]
pub struct Evaluation {
    pub encoder: LabelEncoder,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub samples: usize,
    pub skipped: usize,
    pub train_size: usize,
    pub test_size: usize,
}

impl Evaluation {
    pub fn confused_pairs(&self) -> Vec<ConfusedPair<'_>> {
        self.confusion.confused_pairs(&self.encoder)
    }
}

/// Run the full pipeline: load → encode → split → predict → confusion and report.
pub fn run_evaluation(opts: &EvalOptions) -> anyhow::Result<Evaluation> {
    // 1. Samples.
    let set = phonemeval_store::load_embeddings(&opts.embeddings_dir, &opts.metadata)
        .with_context(|| format!("loading embeddings listed in {}", opts.metadata.display()))?;
    if set.is_empty() {
        anyhow::bail!("no embeddings loaded ({} rows skipped)", set.skipped);
    }

    // 2. Trained artifacts.
    let classifier = model::load_classifier(&opts.classifier).context("loading classifier")?;
    let encoder =
        model::load_label_encoder(&opts.label_encoder).context("loading label encoder")?;

    // 3. Features and encoded labels, parallel to the batch rows.
    let features = features_from_batch(&set.batch).context("reading embedding column")?;
    let labels = labels_from_batch(&set.batch).context("reading phoneme column")?;
    let y = encoder.transform(&labels).context("encoding phoneme labels")?;

    classifier
        .ensure_compatible(&encoder, set.dim)
        .context("classifier does not match label encoder or embeddings")?;

    // 4. Test partition.
    let Split { train, test } = match &opts.test_indices {
        Some(path) => {
            let persisted = model::load_test_indices(path).context("loading test indices")?;
            split_from_test_indices(y.len(), &persisted.test)
                .with_context(|| format!("applying test indices from {}", path.display()))?
        }
        None => stratified_split(&y, opts.test_ratio, opts.seed)
            .context("splitting dataset into train and test")?,
    };

    debug!(train = train.len(), test = test.len(), "partitioned samples");

    // 5. Predict the held-out samples.
    let test_features: Vec<&[f32]> = test.iter().map(|&i| features[i].as_slice()).collect();
    let y_true: Vec<usize> = test.iter().map(|&i| y[i]).collect();
    let y_pred = classifier.predict_batch(&test_features);

    // 6. Score.
    let confusion = ConfusionMatrix::from_predictions(&y_true, &y_pred, encoder.len())
        .context("building confusion matrix")?;
    let report = ClassificationReport::from_confusion(&confusion, &encoder);

    Ok(Evaluation {
        encoder,
        confusion,
        report,
        samples: set.len(),
        skipped: set.skipped,
        train_size: train.len(),
        test_size: test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonemeval_store::npy;
    use std::fmt::Write as _;
    use std::path::Path;
    use tempfile::TempDir;

    const PHONEMES: [&str; 3] = ["AA", "IY", "UW"];

    /// Ten samples per phoneme along its own axis, plus `missing` rows whose
    /// vector file is never written.
    fn write_dataset(dir: &Path, missing: usize) {
        let mut csv = String::from("embedding_filename,phoneme\n");
        for (class, phoneme) in PHONEMES.iter().enumerate() {
            for i in 0..10 {
                let file = format!("{phoneme}_{i}.npy");
                writeln!(csv, "{file},{phoneme}").unwrap();
                let mut v = vec![0.1f32; 3];
                v[class] = 1.0 + i as f32 * 0.01;
                npy::write_vector(&dir.join(&file), &v).unwrap();
            }
        }
        for i in 0..missing {
            writeln!(csv, "gone_{i}.npy,AA").unwrap();
        }
        std::fs::write(dir.join("metadata.csv"), csv).unwrap();
    }

    fn write_models(dir: &Path, centroids: &str) {
        std::fs::write(
            dir.join("clf.json"),
            format!(r#"{{"kind": "nearest_centroid", "centroids": {centroids}}}"#),
        )
        .unwrap();
        std::fs::write(dir.join("le.json"), r#"{"classes": ["AA", "IY", "UW"]}"#).unwrap();
    }

    fn options(dir: &Path) -> EvalOptions {
        EvalOptions {
            embeddings_dir: dir.to_path_buf(),
            metadata: dir.join("metadata.csv"),
            classifier: dir.join("clf.json"),
            label_encoder: dir.join("le.json"),
            test_indices: None,
            seed: 42,
            test_ratio: 0.2,
        }
    }

    #[test]
    fn perfect_classifier_has_no_confusions() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 4);
        write_models(tmp.path(), "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]");

        let eval = run_evaluation(&options(tmp.path())).unwrap();
        assert_eq!(eval.samples, 30);
        assert_eq!(eval.skipped, 4);
        assert_eq!(eval.test_size, 6);
        assert_eq!(eval.train_size, 24);
        assert!(eval.confused_pairs().is_empty());
        assert!((eval.report.accuracy - 1.0).abs() < 1e-9);
        assert!(eval.report.low_precision(0.75).is_empty());
        assert_eq!(eval.confusion.n_classes(), 3);
    }

    #[test]
    fn swapped_centroids_surface_as_confusions() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        // IY and UW centroids swapped: every IY is predicted UW and vice versa.
        write_models(tmp.path(), "[[1, 0, 0], [0, 0, 1], [0, 1, 0]]");

        let eval = run_evaluation(&options(tmp.path())).unwrap();
        let pairs = eval.confused_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].count, 2);
        assert!(pairs.iter().all(|p| p.true_label != p.predicted_label));

        let low: Vec<&str> = eval
            .report
            .low_precision(0.75)
            .iter()
            .map(|m| m.label.as_str())
            .collect();
        assert_eq!(low, vec!["IY", "UW"]);
    }

    #[test]
    fn same_seed_gives_same_result() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        write_models(tmp.path(), "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]");

        let a = run_evaluation(&options(tmp.path())).unwrap();
        let b = run_evaluation(&options(tmp.path())).unwrap();
        assert_eq!(a.confusion, b.confusion);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn persisted_test_indices_define_test_partition() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        write_models(tmp.path(), "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]");
        std::fs::write(tmp.path().join("test.json"), r#"{"test": [0, 10, 20, 21]}"#).unwrap();

        let mut opts = options(tmp.path());
        opts.test_indices = Some(tmp.path().join("test.json"));
        let eval = run_evaluation(&opts).unwrap();
        assert_eq!(eval.test_size, 4);
        assert_eq!(eval.train_size, 26);
        assert_eq!(eval.confusion.row_total(2), 2);
    }

    #[test]
    fn out_of_range_test_index_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        write_models(tmp.path(), "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]");
        std::fs::write(tmp.path().join("test.json"), r#"{"test": [30]}"#).unwrap();

        let mut opts = options(tmp.path());
        opts.test_indices = Some(tmp.path().join("test.json"));
        assert!(run_evaluation(&opts).is_err());
    }

    #[test]
    fn all_vector_files_missing_is_fatal() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("metadata.csv"),
            "embedding_filename,phoneme\na.npy,AA\nb.npy,IY\n",
        )
        .unwrap();
        write_models(tmp.path(), "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]");

        let err = run_evaluation(&options(tmp.path())).unwrap_err();
        assert_eq!(err.to_string(), "no embeddings loaded (2 rows skipped)");
    }

    #[test]
    fn missing_classifier_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        let err = run_evaluation(&options(tmp.path())).unwrap_err();
        assert!(format!("{err:#}").contains("loading classifier"));
    }

    #[test]
    fn unknown_label_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        write_models(tmp.path(), "[[1, 0, 0], [0, 1, 0], [0, 0, 1]]");
        std::fs::write(tmp.path().join("le.json"), r#"{"classes": ["AA", "EH", "IY"]}"#).unwrap();

        let err = run_evaluation(&options(tmp.path())).unwrap_err();
        assert!(format!("{err:#}").contains("UW"));
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_dataset(tmp.path(), 0);
        write_models(tmp.path(), "[[1, 0], [0, 1], [1, 1]]");
        assert!(run_evaluation(&options(tmp.path())).is_err());
    }
}
