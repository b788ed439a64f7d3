use clap::Parser;
use rmlp::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pixel values are stored as 0..=255.
const PIXEL_MAX: f64 = 255.0;
const NUM_CLASSES: usize = 10;

#[derive(Parser, Debug)]
#[command(version, about = "Train a digit classifier on MNIST CSV files")]
struct Args {
    /// Training CSV, one `label,p0,...,p783` record per line
    #[arg(long)]
    train: PathBuf,

    /// Test CSV in the same layout
    #[arg(long)]
    test: PathBuf,

    /// JSON network config; defaults to 784-128-64-10
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "10")]
    epochs: usize,

    /// Training rows held out for validation
    #[arg(long, default_value = "0")]
    validation: usize,

    /// The CSV files start with a header line
    #[arg(long)]
    headers: bool,
}

fn default_config() -> NetworkConfig {
    NetworkConfig::new(784)
        .add_dense(128, Activation::Relu)
        .add_dense(64, Activation::Relu)
        .add_dense(NUM_CLASSES, Activation::Softmax)
        .loss(Loss::CrossEntropy)
        .learning_rate(0.1)
        .learning_rate_decay(0.95, DecaySchedule::PerEpoch)
        .batch_size(32)
        .seed(7)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => NetworkConfig::from_path(path)?,
        None => default_config(),
    };

    let start = Instant::now();
    let train = Dataset::from_labeled_csv(&args.train, NUM_CLASSES, PIXEL_MAX, args.headers)?;
    let test = Dataset::from_labeled_csv(&args.test, NUM_CLASSES, PIXEL_MAX, args.headers)?;
    info!(
        train = train.len(),
        test = test.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded data"
    );

    let (validation, train) = if args.validation > 0 {
        let (head, tail) = train.split_at(args.validation)?;
        (Some(head), tail)
    } else {
        (None, train)
    };

    let mut model = Network::new(&config)?;
    println!("{}", model.summary());

    let start = Instant::now();
    Trainer::from_config(&config, args.epochs).fit(
        &mut model,
        &train,
        validation.as_ref(),
        &mut LogObserver,
    )?;
    info!(elapsed_s = start.elapsed().as_secs_f64(), "training finished");

    let eval = model.evaluate(test.features(), test.targets())?;
    println!(
        "test loss: {:.4}, test accuracy: {:.2}%",
        eval.avg_loss,
        eval.accuracy * 100.0
    );
    Ok(())
}
