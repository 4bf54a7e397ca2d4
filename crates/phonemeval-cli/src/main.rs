//! phonemeval: confusion analysis of a trained phoneme classifier.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use phonemeval_ai::model::{DEFAULT_CLASSIFIER_PATH, DEFAULT_LABEL_ENCODER_PATH};
use phonemeval_ai::split::{DEFAULT_SEED, DEFAULT_TEST_RATIO};
use tracing_subscriber::EnvFilter;

mod display;
mod evaluate;

#[derive(Parser)]
#[command(name = "phonemeval")]
#[command(version)]
#[command(about = "Find the phoneme pairs a trained classifier confuses most", long_about = None)]
struct Cli {
    /// Directory holding metadata.csv and the .npy vectors it references
    #[arg(long, env = "PHONEMEVAL_EMBEDDINGS_DIR", default_value = "phoneme_embeddings")]
    embeddings_dir: PathBuf,

    /// Metadata CSV [default: <embeddings-dir>/metadata.csv]
    #[arg(long, env = "PHONEMEVAL_METADATA")]
    metadata: Option<PathBuf>,

    /// Trained classifier (JSON)
    #[arg(long, env = "PHONEMEVAL_CLASSIFIER", default_value = DEFAULT_CLASSIFIER_PATH)]
    classifier: PathBuf,

    /// Fitted label encoder (JSON)
    #[arg(long, env = "PHONEMEVAL_LABEL_ENCODER", default_value = DEFAULT_LABEL_ENCODER_PATH)]
    label_encoder: PathBuf,

    /// Test partition persisted by training ({"test": [...]}); overrides the seeded split
    #[arg(long, env = "PHONEMEVAL_TEST_INDICES")]
    test_indices: Option<PathBuf>,

    /// Seed for the stratified split
    #[arg(long, env = "PHONEMEVAL_SEED", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Fraction of samples held out for testing
    #[arg(long, env = "PHONEMEVAL_TEST_RATIO", default_value_t = DEFAULT_TEST_RATIO)]
    test_ratio: f64,

    /// Number of confused pairs to print
    #[arg(long, env = "PHONEMEVAL_TOP", default_value_t = display::DEFAULT_TOP)]
    top: usize,

    /// Print labels whose precision is below this value
    #[arg(
        long,
        env = "PHONEMEVAL_PRECISION_THRESHOLD",
        default_value_t = display::DEFAULT_PRECISION_THRESHOLD
    )]
    precision_threshold: f64,

    /// Also print the full classification report
    #[arg(long, env = "PHONEMEVAL_REPORT")]
    report: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// `--metadata`, or `metadata.csv` inside the embeddings directory.
    fn metadata_path(&self) -> PathBuf {
        self.metadata
            .clone()
            .unwrap_or_else(|| self.embeddings_dir.join("metadata.csv"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("phonemeval v{}", env!("CARGO_PKG_VERSION"));

    let metadata = cli.metadata_path();

    let opts = evaluate::EvalOptions {
        embeddings_dir: cli.embeddings_dir,
        metadata,
        classifier: cli.classifier,
        label_encoder: cli.label_encoder,
        test_indices: cli.test_indices,
        seed: cli.seed,
        test_ratio: cli.test_ratio,
    };

    let eval = evaluate::run_evaluation(&opts)?;
    tracing::info!(
        samples = eval.samples,
        skipped = eval.skipped,
        train = eval.train_size,
        test = eval.test_size,
        accuracy = eval.report.accuracy,
        "evaluation complete"
    );

    display::print_confused_pairs(&eval.confused_pairs(), cli.top);
    display::print_low_precision(&eval.report, cli.precision_threshold);
    if cli.report {
        println!();
        display::print_report(&eval.report);
    }

    Ok(())
}
