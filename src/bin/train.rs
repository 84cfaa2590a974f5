//! Fit a logistic-regression classifier on a parquet training set.
//!
//! The training file is preprocessed in training mode (fitting the id-list
//! vocabulary), the model is trained full-batch on the CPU, and an optional
//! evaluation file is then preprocessed in evaluation mode against the same
//! vocabulary and scored.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --release --bin train -- \
//!     --features data/features.json --train data/train.parquet --eval data/test.parquet
//! ```

use std::path::PathBuf;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::optim::AdamConfig;
use clap::Parser;
use confluence::features::{FeatureAssembler, FeatureTensors};
use confluence::intake::{DataReader, InputPreproc, Mode};
use confluence::model::LogisticRegressionConfig;
use confluence::training::{EvalMetrics, TrainingConfig, evaluate, fit};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Train a logistic-regression classifier on preprocessed features")]
struct Args {
    /// Feature description JSON (label + the four feature group name lists).
    #[arg(long)]
    features: PathBuf,

    /// Training parquet file.
    #[arg(long)]
    train: PathBuf,

    /// Optional evaluation parquet file, encoded with the training vocabulary.
    #[arg(long)]
    eval: Option<PathBuf>,

    /// Total full-batch training steps.
    #[arg(long, default_value_t = 1000)]
    num_steps: usize,

    /// Learning rate.
    #[arg(long, default_value_t = 1e-2)]
    lr: f64,

    /// Steps between loss reports.
    #[arg(long, default_value_t = 100)]
    log_interval: usize,

    /// Leave id-list columns out of the classifier input instead of one-hot encoding them.
    #[arg(long, default_value_t = false)]
    dense_only: bool,
}

fn report(split: &str, metrics: &EvalMetrics) {
    info!(
        "{split}: {} examples, log_loss = {:.6}, accuracy = {:.4}",
        metrics.num_examples, metrics.log_loss, metrics.accuracy
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    type B = NdArray;
    type AB = Autodiff<B>;
    let device = NdArrayDevice::default();

    let reader = DataReader::from_json_file(&args.features)?;
    let assembler = if args.dense_only {
        FeatureAssembler::dense_only()
    } else {
        FeatureAssembler::default()
    };

    let mut preproc = InputPreproc::new(&reader, Mode::Train);
    let raw = reader.read_parquet(&args.train)?;
    let train_batch = preproc.transform(&raw)?;
    let input_dim = assembler.input_dim(&reader, preproc.vocabulary(), &raw.features().schema())?;
    let train_tensors =
        FeatureTensors::<AB>::from_batch(&train_batch, &assembler, preproc.vocabulary(), &device)?;
    info!(
        "Training on {} rows with {} input features",
        train_tensors.num_rows(),
        input_dim
    );

    let config = TrainingConfig::new(
        LogisticRegressionConfig::new(input_dim),
        AdamConfig::new(),
    )
    .with_learning_rate(args.lr)
    .with_num_steps(args.num_steps)
    .with_log_interval(args.log_interval);

    let progress = ProgressBar::new(args.num_steps as u64);
    progress.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
    )?);

    let model = fit(
        &config,
        train_tensors.dense.clone(),
        train_tensors.labels.clone(),
        &device,
        |s| {
            progress.set_position(s.step as u64 + 1);
            progress.set_message(format!("loss {:.6}", s.loss));
        },
    );
    progress.finish_and_clear();

    let metrics = evaluate(&model, train_tensors.dense.inner(), train_tensors.labels.inner())?;
    report("train", &metrics);

    if let Some(eval_path) = &args.eval {
        preproc.set_mode(Mode::Eval);
        let eval_batch = preproc.transform(&reader.read_parquet(eval_path)?)?;
        let eval_tensors =
            FeatureTensors::<B>::from_batch(&eval_batch, &assembler, preproc.vocabulary(), &device)?;
        let metrics = evaluate(&model, eval_tensors.dense, eval_tensors.labels)?;
        report("eval", &metrics);
    }

    Ok(())
}
