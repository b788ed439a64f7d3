use rmlp::prelude::{
    Activation, DecaySchedule, Dataset, EpochReport, Loss, Matrix, Network, NetworkConfig, Trainer,
};

fn xor_config() -> NetworkConfig {
    NetworkConfig::new(2)
        .add_dense(4, Activation::Sigmoid)
        .add_dense(1, Activation::Sigmoid)
        .loss(Loss::Mse)
        .learning_rate(4.0)
        .learning_rate_decay(1.0, DecaySchedule::PerEpoch)
        .batch_size(4)
        .seed(2024)
}

#[test]
fn xor_converges_with_full_batch_steps() {
    let data = Dataset::xor().unwrap();
    let mut net = Network::new(&xor_config()).unwrap();
    for _ in 0..500 {
        net.train_step(data.features(), data.targets()).unwrap();
    }

    let predictions = net.predict(data.features()).unwrap();
    let mse: f64 = predictions
        .as_slice()
        .iter()
        .zip(data.targets().as_slice())
        .map(|(p, y)| (y - p) * (y - p))
        .sum::<f64>()
        / data.len() as f64;
    assert!(mse < 0.05, "mse {}", mse);
    assert!(net.is_finite());
}

#[test]
fn trainer_reports_falling_loss_on_xor() {
    let config = xor_config();
    let data = Dataset::xor().unwrap();
    let mut net = Network::new(&config).unwrap();

    let mut history: Vec<EpochReport> = Vec::new();
    let report = Trainer::from_config(&config, 500)
        .evaluate_every(100)
        .fit(&mut net, &data, None, &mut |r: &EpochReport| history.push(*r))
        .unwrap();

    assert_eq!(report.history, history);
    assert_eq!(history.iter().map(|r| r.epoch).collect::<Vec<_>>(), vec![100, 200, 300, 400, 500]);
    assert_eq!(report.batches_run, 500);
    let last = report.last().unwrap();
    assert!(last.avg_loss < history[0].avg_loss || last.avg_loss < 1e-3);
    assert_eq!(last.accuracy, 1.0);
    assert_eq!(last.learning_rate, 4.0);
}

#[test]
fn softmax_cross_entropy_separates_two_clusters() {
    let features = Matrix::from_rows(&[
        [0.0, 0.0],
        [0.1, 0.2],
        [0.2, 0.1],
        [0.1, 0.1],
        [1.0, 1.0],
        [0.9, 0.8],
        [0.8, 0.9],
        [0.9, 0.9],
    ])
    .unwrap();
    let mut labels = vec![[1.0, 0.0]; 4];
    labels.extend(vec![[0.0, 1.0]; 4]);
    let data = Dataset::new(features, Matrix::from_rows(&labels).unwrap()).unwrap();

    let config = NetworkConfig::new(2)
        .add_dense(8, Activation::Tanh)
        .add_dense(2, Activation::Softmax)
        .loss(Loss::CrossEntropy)
        .learning_rate(0.5)
        .learning_rate_decay(1.0, DecaySchedule::PerEpoch)
        .batch_size(8)
        .seed(8);
    let mut net = Network::new(&config).unwrap();
    let before = net.evaluate(data.features(), data.targets()).unwrap();

    let report = Trainer::from_config(&config, 500)
        .fit(&mut net, &data, None, &mut rmlp::prelude::LogObserver)
        .unwrap();
    let after = report.last().unwrap();
    assert!(after.avg_loss < before.avg_loss);
    assert!(after.avg_loss < 0.05, "loss {}", after.avg_loss);
    assert_eq!(after.accuracy, 1.0);

    let probabilities = net.predict(data.features()).unwrap();
    for row in probabilities.rows_iter() {
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn validation_set_is_used_for_reports() {
    let config = xor_config();
    let data = Dataset::xor().unwrap();
    let (validation, _) = data.split_at(2).unwrap();
    let mut net = Network::new(&config).unwrap();
    let report = Trainer::from_config(&config, 3)
        .fit(&mut net, &data, Some(&validation), &mut |_: &EpochReport| {})
        .unwrap();
    let expected = net.evaluate(validation.features(), validation.targets()).unwrap();
    assert_eq!(report.last().unwrap().avg_loss, expected.avg_loss);
}
