use crate::prelude::*;
use tracing::{error, info};

/// One evaluation point of a training run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub avg_loss: f64,
    pub accuracy: f64,
    pub learning_rate: f64,
}

/// Receives evaluation results while a [`Trainer`] runs.
pub trait TrainingObserver {
    fn on_evaluation(&mut self, report: &EpochReport);
}

impl<F: FnMut(&EpochReport)> TrainingObserver for F {
    fn on_evaluation(&mut self, report: &EpochReport) {
        self(report)
    }
}

/// Emits each evaluation as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl TrainingObserver for LogObserver {
    fn on_evaluation(&mut self, report: &EpochReport) {
        info!(
            epoch = report.epoch,
            loss = report.avg_loss,
            accuracy = report.accuracy,
            learning_rate = report.learning_rate,
            "evaluation"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub history: Vec<EpochReport>,
    pub epochs_run: usize,
    pub batches_run: usize,
}

impl TrainingReport {
    pub fn last(&self) -> Option<&EpochReport> {
        self.history.last()
    }
}

/// Mini-batch training loop over a [`Dataset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trainer {
    pub epochs: usize,
    pub batch_size: usize,
    /// Evaluate every this many epochs; the final epoch is always evaluated.
    pub evaluate_every: usize,
}

impl Trainer {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        Self {
            epochs,
            batch_size,
            evaluate_every: 1,
        }
    }

    pub fn from_config(config: &NetworkConfig, epochs: usize) -> Self {
        Self::new(epochs, config.batch_size)
    }

    pub fn evaluate_every(mut self, epochs: usize) -> Self {
        self.evaluate_every = epochs;
        self
    }

    /// Trains `network` on `train`, reporting on `validation` when given and on
    /// the training set otherwise.
    ///
    /// A failing batch stops the run with [`NNError::TrainingAborted`]; layers
    /// already updated in that batch keep their new parameters.
    pub fn fit<O: TrainingObserver + ?Sized>(
        &self,
        network: &mut Network,
        train: &Dataset,
        validation: Option<&Dataset>,
        observer: &mut O,
    ) -> Result<TrainingReport> {
        if self.batch_size == 0 || self.evaluate_every == 0 {
            return Err(NNError::ConfigInvalid(
                "batch size and evaluation interval must be greater than 0".to_string(),
            ));
        }
        for data in std::iter::once(train).chain(validation) {
            if data.input_size() != network.input_size()
                || data.output_size() != network.output_size()
            {
                return Err(NNError::ShapeMismatch(format!(
                    "dataset is {}->{} but the network is {}->{}",
                    data.input_size(),
                    data.output_size(),
                    network.input_size(),
                    network.output_size()
                )));
            }
        }
        let num_batches = train.len() / self.batch_size;
        if num_batches == 0 {
            return Err(NNError::Dataset(format!(
                "{} samples do not fill a batch of {}",
                train.len(),
                self.batch_size
            )));
        }
        let eval_set = validation.unwrap_or(train);
        let schedule = network.optimizer().decay_schedule;

        let mut report = TrainingReport::default();
        for epoch in 1..=self.epochs {
            for (batch, data) in train.batches(self.batch_size).enumerate() {
                let step = data.and_then(|(x, y)| network.train_step(&x, &y));
                if let Err(source) = step {
                    error!(epoch, batch, error = %source, "training aborted");
                    return Err(NNError::TrainingAborted {
                        epoch,
                        batch,
                        source: Box::new(source),
                    });
                }
                report.batches_run += 1;
                if schedule == DecaySchedule::PerBatch {
                    network.decay_learning_rate();
                }
            }
            report.epochs_run = epoch;

            if epoch % self.evaluate_every == 0 || epoch == self.epochs {
                let eval = match network.evaluate(eval_set.features(), eval_set.targets()) {
                    Ok(eval) => eval,
                    Err(source) => {
                        error!(epoch, error = %source, "evaluation failed");
                        return Err(NNError::TrainingAborted {
                            epoch,
                            batch: num_batches,
                            source: Box::new(source),
                        });
                    }
                };
                let epoch_report = EpochReport {
                    epoch,
                    avg_loss: eval.avg_loss,
                    accuracy: eval.accuracy,
                    learning_rate: network.learning_rate(),
                };
                observer.on_evaluation(&epoch_report);
                report.history.push(epoch_report);
            }

            if schedule == DecaySchedule::PerEpoch {
                network.decay_learning_rate();
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn xor_network(decay: f64, schedule: DecaySchedule) -> Network {
        Network::new(
            &NetworkConfig::new(2)
                .add_dense(4, Activation::Sigmoid)
                .add_dense(1, Activation::Sigmoid)
                .learning_rate(1.0)
                .learning_rate_decay(decay, schedule)
                .seed(5),
        )
        .unwrap()
    }

    #[test]
    fn reports_every_interval_and_the_last_epoch() {
        let data = Dataset::xor().unwrap();
        let mut net = xor_network(1.0, DecaySchedule::PerEpoch);
        let mut seen = Vec::new();
        let report = Trainer::new(10, 4)
            .evaluate_every(4)
            .fit(&mut net, &data, None, &mut |r: &EpochReport| seen.push(r.epoch))
            .unwrap();
        assert_eq!(seen, vec![4, 8, 10]);
        assert_eq!(report.epochs_run, 10);
        assert_eq!(report.batches_run, 10);
    }

    #[test]
    fn learning_rate_decays_on_schedule() {
        let data = Dataset::xor().unwrap();

        let mut per_epoch = xor_network(0.5, DecaySchedule::PerEpoch);
        let report = Trainer::new(3, 2)
            .fit(&mut per_epoch, &data, None, &mut LogObserver)
            .unwrap();
        let rates: Vec<f64> = report.history.iter().map(|r| r.learning_rate).collect();
        assert_eq!(rates, vec![1.0, 0.5, 0.25]);
        assert_abs_diff_eq!(per_epoch.learning_rate(), 0.125);

        let mut per_batch = xor_network(0.5, DecaySchedule::PerBatch);
        Trainer::new(1, 2)
            .fit(&mut per_batch, &data, None, &mut LogObserver)
            .unwrap();
        assert_abs_diff_eq!(per_batch.learning_rate(), 0.25);
    }

    #[test]
    fn mismatched_dataset_is_rejected_before_training() {
        let mut net = xor_network(1.0, DecaySchedule::PerEpoch);
        let before = net.clone();
        let wide = Dataset::new(Matrix::zeros(4, 3).unwrap(), Matrix::zeros(4, 1).unwrap()).unwrap();
        let err = Trainer::new(1, 2).fit(&mut net, &wide, None, &mut LogObserver);
        assert!(matches!(err, Err(NNError::ShapeMismatch(_))));
        assert_eq!(net.layers(), before.layers());

        let err = Trainer::new(1, 8).fit(&mut net, &Dataset::xor().unwrap(), None, &mut LogObserver);
        assert!(matches!(err, Err(NNError::Dataset(_))));
    }

    #[test]
    fn strict_divergence_aborts_with_progress() {
        let mut net = Network::new(
            &NetworkConfig::new(2)
                .add_dense(1, Activation::LeakyRelu)
                .learning_rate(1e308)
                .strict(true)
                .seed(1),
        )
        .unwrap();
        let data = Dataset::new(
            Matrix::filled(4, 2, 1e3).unwrap(),
            Matrix::filled(4, 1, -1e3).unwrap(),
        )
        .unwrap();
        let before = net.clone();
        let err = Trainer::new(2, 2)
            .fit(&mut net, &data, None, &mut LogObserver)
            .unwrap_err();
        match err {
            NNError::TrainingAborted { epoch, batch, source } => {
                assert_eq!((epoch, batch), (1, 0));
                assert!(matches!(*source, NNError::DivergedTraining { layer: 0 }));
            }
            other => panic!("unexpected error {}", other),
        }
        assert_eq!(net.layers(), before.layers());
    }

    #[test]
    fn failed_evaluation_reports_progress() {
        let mut net = xor_network(1.0, DecaySchedule::PerEpoch);
        let data = Dataset::xor().unwrap();
        let (empty, _) = data.split_at(0).unwrap();
        let err = Trainer::new(2, 2)
            .fit(&mut net, &data, Some(&empty), &mut LogObserver)
            .unwrap_err();
        match err {
            NNError::TrainingAborted { epoch, batch, source } => {
                assert_eq!((epoch, batch), (1, 2));
                assert!(matches!(*source, NNError::Dataset(_)));
            }
            other => panic!("unexpected error {}", other),
        }
    }
}
