use clap::Parser;
use rmlp::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Train a 2-4-1 sigmoid network on XOR")]
struct Args {
    #[arg(long, default_value = "5000")]
    epochs: usize,

    #[arg(long, default_value = "2.0")]
    learning_rate: f64,

    /// Seed for weight initialization
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Evaluate every this many epochs
    #[arg(long, default_value = "500")]
    report_every: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = NetworkConfig::new(2)
        .add_dense(4, Activation::Sigmoid)
        .add_dense(1, Activation::Sigmoid)
        .loss(Loss::Mse)
        .learning_rate(args.learning_rate)
        .learning_rate_decay(1.0, DecaySchedule::PerEpoch)
        .batch_size(4)
        .seed(args.seed);
    let mut model = Network::new(&config)?;
    println!("{}", model.summary());

    let data = Dataset::xor()?;
    let report = Trainer::from_config(&config, args.epochs)
        .evaluate_every(args.report_every)
        .fit(&mut model, &data, None, &mut LogObserver)?;

    let predictions = model.predict(data.features())?;
    for (x, y) in data.features().rows_iter().zip(predictions.rows_iter()) {
        println!("{:?} -> {:.4}", x, y[0]);
    }
    if let Some(last) = report.last() {
        println!("final loss: {:.6}", last.avg_loss);
    }
    Ok(())
}
