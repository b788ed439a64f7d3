use crate::prelude::*;
use crate::config::validate_learning_rate;
use crate::core::losses::softmax_cross_entropy_gradient;
use crate::core::metrics::count_correct;
use crate::core::optimizers::Optimization;
use tracing::debug;

/// Rows forwarded at once by [`Network::evaluate`].
const EVAL_CHUNK: usize = 1024;

/// A stack of dense layers trained by mini-batch SGD.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Dense>,
    loss: Loss,
    learning_rate: f64,
    optimizer: OptimizerConfig,
    input_size: usize,
}

impl Network {
    /// Builds and randomly initializes a network, seeded from `config.seed` when set.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut initializer = Initializer::from_seed(config.seed);
        Self::with_initializer(config, &mut initializer)
    }

    pub fn with_initializer(config: &NetworkConfig, initializer: &mut Initializer) -> Result<Self> {
        config.validate()?;
        let mut layers = Vec::with_capacity(config.layers.len());
        let mut prev = config.input_size;
        for layer in &config.layers {
            layers.push(Dense::new(layer.width, prev, layer.activation, initializer)?);
            prev = layer.width;
        }
        Self::from_layers(
            config.input_size,
            layers,
            config.loss,
            config.learning_rate,
            config.optimizer(),
        )
    }

    /// Assembles a network from prebuilt layers, checking that their widths chain.
    pub fn from_layers(
        input_size: usize,
        layers: Vec<Dense>,
        loss: Loss,
        learning_rate: f64,
        optimizer: OptimizerConfig,
    ) -> Result<Self> {
        if input_size == 0 {
            return Err(NNError::ConfigInvalid(
                "input size must be greater than 0".to_string(),
            ));
        }
        if layers.is_empty() {
            return Err(NNError::ConfigInvalid("Model has no layers".to_string()));
        }
        validate_learning_rate(learning_rate)?;
        optimizer.validate()?;

        let mut prev = input_size;
        for (i, layer) in layers.iter().enumerate() {
            if layer.prev_num_neurons() != prev {
                return Err(NNError::ConfigInvalid(format!(
                    "layer {} expects {} inputs but the previous width is {}",
                    i,
                    layer.prev_num_neurons(),
                    prev
                )));
            }
            prev = layer.num_neurons();
        }

        Ok(Self {
            layers,
            loss,
            learning_rate,
            optimizer,
            input_size,
        })
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Dense> {
        self.layers.get_mut(idx)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.num_neurons()).unwrap_or(0)
    }

    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn optimizer(&self) -> &OptimizerConfig {
        &self.optimizer
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        validate_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    /// Multiplies the learning rate by the configured decay factor.
    pub fn decay_learning_rate(&mut self) {
        self.learning_rate *= self.optimizer.learning_rate_decay;
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.layers
            .iter()
            .all(|l| l.weights().is_finite() && l.biases().iter().all(|b| b.is_finite()))
    }

    fn check_input(&self, inputs: &Matrix) -> Result<()> {
        if inputs.cols() != self.input_size {
            return Err(NNError::ShapeMismatch(format!(
                "network expects {} input columns, got {}",
                self.input_size,
                inputs.cols()
            )));
        }
        Ok(())
    }

    /// Forward pass keeping every layer's `z` and `a` for backpropagation.
    pub fn forward(&self, inputs: &Matrix) -> Result<ActivationCache> {
        self.check_input(inputs)?;
        let mut cache = ActivationCache::new(inputs.try_clone()?, self.layers.len());
        for layer in self.layers.iter() {
            let (z, a) = layer.forward(cache.output())?;
            cache.push(z, a);
        }
        Ok(cache)
    }

    /// Forward pass that keeps only the final output.
    pub fn predict(&self, inputs: &Matrix) -> Result<Matrix> {
        self.check_input(inputs)?;
        let mut layers = self.layers.iter();
        let Some(first) = layers.next() else {
            return inputs.try_clone();
        };
        let (_, mut a) = first.forward(inputs)?;
        for layer in layers {
            (_, a) = layer.forward(&a)?;
        }
        Ok(a)
    }

    /// Loss gradient with respect to the output layer's pre-activation.
    pub fn output_delta(&self, cache: &ActivationCache, targets: &Matrix) -> Result<Matrix> {
        let last = self.layers.len() - 1;
        if cache.num_layers() != self.layers.len() {
            return Err(NNError::ShapeMismatch(format!(
                "cache holds {} layers, network has {}",
                cache.num_layers(),
                self.layers.len()
            )));
        }
        let outputs = cache.output();
        if outputs.shape() != targets.shape() {
            return Err(NNError::ShapeMismatch(format!(
                "Prediction shape {:?} doesn't match target shape {:?}",
                outputs.shape(),
                targets.shape()
            )));
        }
        let activation = self.layers[last].activation;
        if self.loss.pairs_with(activation) {
            softmax_cross_entropy_gradient(outputs, targets)
        } else {
            let da = self.loss.gradient(outputs, targets)?;
            activation.backward(cache.pre_activation(last), &da)
        }
    }

    /// Delta of hidden layer `idx` from the error projected down from layer `idx + 1`.
    fn hidden_delta(&self, idx: usize, projected: &Matrix, cache: &ActivationCache) -> Result<Matrix> {
        self.layers[idx]
            .activation
            .backward(cache.pre_activation(idx), projected)
    }

    /// Analytic gradients for every layer, leaving the parameters untouched.
    pub fn gradients(&self, cache: &ActivationCache, targets: &Matrix) -> Result<Vec<Gradients>> {
        let mut delta = self.output_delta(cache, targets)?;
        let mut grads = Vec::with_capacity(self.layers.len());
        for idx in (0..self.layers.len()).rev() {
            grads.push(self.layers[idx].gradients(&delta, cache.activation(idx))?);
            if idx > 0 {
                let projected = self.layers[idx].backward(&delta)?;
                delta = self.hidden_delta(idx - 1, &projected, cache)?;
            }
        }
        grads.reverse();
        Ok(grads)
    }

    /// Backpropagates one batch and applies the SGD update layer by layer,
    /// last layer first.
    ///
    /// Each layer's error is projected through its weights before that layer
    /// is updated, so the step matches [`Network::gradients`] exactly.
    pub fn backward(&mut self, cache: ActivationCache, targets: &Matrix) -> Result<()> {
        let mut delta = self.output_delta(&cache, targets)?;
        for idx in (0..self.layers.len()).rev() {
            let grads = self.layers[idx].gradients(&delta, cache.activation(idx))?;
            let projected = if idx > 0 {
                Some(self.layers[idx].backward(&delta)?)
            } else {
                None
            };

            let learning_rate = self.learning_rate;
            let optimizer = &self.optimizer;
            self.layers[idx].optimize(idx, grads, learning_rate, optimizer)?;

            if let Some(projected) = projected {
                delta = self.hidden_delta(idx - 1, &projected, &cache)?;
            }
        }
        Ok(())
    }

    /// One forward + backward + update step on a batch.
    pub fn train_step(&mut self, inputs: &Matrix, targets: &Matrix) -> Result<()> {
        if inputs.rows() != targets.rows() {
            return Err(NNError::ShapeMismatch(format!(
                "{} input rows but {} target rows",
                inputs.rows(),
                targets.rows()
            )));
        }
        let cache = self.forward(inputs)?;
        self.backward(cache, targets)?;
        debug!(batch_size = inputs.rows(), learning_rate = self.learning_rate, "batch step");
        Ok(())
    }

    /// Average loss per sample and accuracy over a whole set.
    pub fn evaluate(&self, features: &Matrix, targets: &Matrix) -> Result<Evaluation> {
        if features.rows() != targets.rows() {
            return Err(NNError::ShapeMismatch(format!(
                "{} feature rows but {} target rows",
                features.rows(),
                targets.rows()
            )));
        }
        let n = features.rows();
        if n == 0 {
            return Err(NNError::Dataset("cannot evaluate on an empty set".to_string()));
        }

        let mut total_loss = 0.0;
        let mut correct = 0;
        for start in (0..n).step_by(EVAL_CHUNK) {
            let end = (start + EVAL_CHUNK).min(n);
            let x = features.select_rows(start, end)?;
            let y = targets.select_rows(start, end)?;
            let outputs = self.predict(&x)?;
            total_loss += self.loss.total(&outputs, &y)?;
            correct += count_correct(&outputs, &y)?;
        }
        Ok(Evaluation {
            avg_loss: total_loss / n as f64,
            accuracy: correct as f64 / n as f64,
        })
    }

    pub fn summary(&self) -> String {
        let mut total_param = 0;
        let mut res = "\nModel Network\n".to_string();
        res.push_str("-------------------------------------------------------------\n");
        res.push_str("Layer (Type)\t\t Output shape\t\t No.of params\n");
        for layer in self.layers.iter() {
            let params = layer.num_parameters();
            total_param += params;
            res.push_str(&format!(
                "{} ({:?})\t\t  (None, {})\t\t  {}\n",
                layer.typ(),
                layer.activation,
                layer.num_neurons(),
                params
            ));
        }
        res.push_str("-------------------------------------------------------------\n");
        res.push_str(&format!("Total params: {}\n", total_param));
        res.push_str(&format!("Loss: {:?}, learning rate: {}\n", self.loss, self.learning_rate));
        res
    }
}
