use crate::prelude::*;
use crate::core::optimizers::{apply_optimization, Optimization};

pub trait LayerTrait {
    fn new(
        num_neurons: usize,
        prev_num_neurons: usize,
        activation: Activation,
        initializer: &mut Initializer,
    ) -> Result<Self>
    where
        Self: Sized;

    fn typ(&self) -> String;
}

/// Fully connected layer. `weights` is `num_neurons x prev_num_neurons`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    weights: Matrix,
    biases: Vec<f64>,
    pub activation: Activation,
}

impl LayerTrait for Dense {
    fn new(
        num_neurons: usize,
        prev_num_neurons: usize,
        activation: Activation,
        initializer: &mut Initializer,
    ) -> Result<Self> {
        if num_neurons == 0 || prev_num_neurons == 0 {
            return Err(NNError::ConfigInvalid(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            weights: initializer.weights(num_neurons, prev_num_neurons)?,
            biases: initializer.biases(num_neurons)?,
            activation,
        })
    }

    fn typ(&self) -> String {
        "Dense".into()
    }
}

impl Dense {
    /// Builds a layer from explicit parameters.
    pub fn from_parameters(weights: Matrix, biases: Vec<f64>, activation: Activation) -> Result<Self> {
        if weights.rows() == 0 || weights.cols() == 0 {
            return Err(NNError::ConfigInvalid(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        if biases.len() != weights.rows() {
            return Err(NNError::ConfigInvalid(format!(
                "{} biases for {} neurons",
                biases.len(),
                weights.rows()
            )));
        }
        Ok(Self {
            weights,
            biases,
            activation,
        })
    }

    pub fn num_neurons(&self) -> usize {
        self.weights.rows()
    }

    pub fn prev_num_neurons(&self) -> usize {
        self.weights.cols()
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Mutable views of the parameter values. The shapes stay fixed.
    pub fn parameters_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (self.weights.as_mut_slice(), &mut self.biases)
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Returns `(z, a)` with `z = a_prev · Wᵗ + b`.
    pub fn forward(&self, a: &Matrix) -> Result<(Matrix, Matrix)> {
        if a.cols() != self.prev_num_neurons() {
            return Err(NNError::ShapeMismatch(format!(
                "layer expects {} inputs, got {}",
                self.prev_num_neurons(),
                a.cols()
            )));
        }
        let z = a.product_plus_bias(&self.weights.transpose()?, &self.biases)?;
        let a = self.activation.forward(&z)?;
        Ok((z, a))
    }

    /// Batch-averaged gradients given this layer's delta and its input activations.
    pub fn gradients(&self, delta: &Matrix, prev_a: &Matrix) -> Result<Gradients> {
        if delta.cols() != self.num_neurons() || delta.rows() != prev_a.rows() {
            return Err(NNError::ShapeMismatch(format!(
                "delta {:?} and input {:?} do not fit a {}x{} layer",
                delta.shape(),
                prev_a.shape(),
                self.num_neurons(),
                self.prev_num_neurons()
            )));
        }
        let batch = delta.rows().max(1) as f64;
        // (prev_aᵗ · delta)ᵗ, laid out like the weights
        let weights = delta.transpose()?.product(prev_a)?.map(|g| g / batch)?;
        let biases = delta.column_sum().into_iter().map(|g| g / batch).collect();
        Ok(Gradients { weights, biases })
    }

    /// Projects a delta back through the weights: `delta · W`.
    pub fn backward(&self, delta: &Matrix) -> Result<Matrix> {
        delta.product(&self.weights)
    }
}

impl Optimization for Dense {
    fn optimize(
        &mut self,
        layer: usize,
        grads: Gradients,
        learning_rate: f64,
        config: &OptimizerConfig,
    ) -> Result<()> {
        apply_optimization(
            layer,
            &mut self.weights,
            &mut self.biases,
            grads,
            learning_rate,
            config,
        )
    }
}
