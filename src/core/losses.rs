use crate::prelude::*;
use std::str::FromStr;

/// Predictions are clamped into `[EPSILON, 1 - EPSILON]` before taking logarithms.
pub const CROSS_ENTROPY_EPSILON: f64 = 1e-15;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    Mse,
    CrossEntropy,
}

impl Loss {
    /// Per-element loss for target `y` and prediction `y_hat`.
    pub fn value(&self, y: f64, y_hat: f64) -> f64 {
        match self {
            Self::Mse => mse(y, y_hat),
            Self::CrossEntropy => cross_entropy(y, y_hat),
        }
    }

    /// Per-element derivative with respect to the prediction.
    pub fn derivative(&self, y: f64, y_hat: f64) -> f64 {
        match self {
            Self::Mse => mse_prime(y, y_hat),
            Self::CrossEntropy => cross_entropy_prime(y, y_hat),
        }
    }

    /// True when the output delta can be taken as `outputs - targets` directly.
    pub fn pairs_with(&self, output_activation: Activation) -> bool {
        matches!(
            (self, output_activation),
            (Self::CrossEntropy, Activation::Softmax)
        )
    }

    /// Sum of the per-element loss over a whole batch.
    pub fn total(&self, outputs: &Matrix, targets: &Matrix) -> Result<f64> {
        check_shapes(outputs, targets)?;
        Ok(targets
            .as_slice()
            .iter()
            .zip(outputs.as_slice())
            .map(|(&y, &y_hat)| self.value(y, y_hat))
            .sum())
    }

    /// Elementwise `loss'(y, y_hat)` over a batch.
    pub fn gradient(&self, outputs: &Matrix, targets: &Matrix) -> Result<Matrix> {
        check_shapes(outputs, targets)?;
        let mut grad = Matrix::zeros(outputs.rows(), outputs.cols())?;
        for ((g, &y), &y_hat) in grad
            .as_mut_slice()
            .iter_mut()
            .zip(targets.as_slice())
            .zip(outputs.as_slice())
        {
            *g = self.derivative(y, y_hat);
        }
        Ok(grad)
    }
}

impl FromStr for Loss {
    type Err = NNError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mse" => Ok(Self::Mse),
            "cross_entropy" | "crossentropy" => Ok(Self::CrossEntropy),
            other => Err(NNError::ConfigInvalid(format!("unknown loss '{}'", other))),
        }
    }
}

fn check_shapes(outputs: &Matrix, targets: &Matrix) -> Result<()> {
    if outputs.shape() != targets.shape() {
        return Err(NNError::ShapeMismatch(format!(
            "Prediction shape {:?} doesn't match target shape {:?}",
            outputs.shape(),
            targets.shape()
        )));
    }
    Ok(())
}

/// Average loss per sample: the batch total divided by the number of rows.
pub fn criteria(outputs: &Matrix, targets: &Matrix, loss: Loss) -> Result<f64> {
    let total = loss.total(outputs, targets)?;
    Ok(if outputs.rows() == 0 {
        0.0
    } else {
        total / outputs.rows() as f64
    })
}

pub fn mse(y: f64, y_hat: f64) -> f64 {
    0.5 * (y - y_hat) * (y - y_hat)
}

pub fn mse_prime(y: f64, y_hat: f64) -> f64 {
    y_hat - y
}

fn clamp_probability(y_hat: f64) -> f64 {
    y_hat.clamp(CROSS_ENTROPY_EPSILON, 1.0 - CROSS_ENTROPY_EPSILON)
}

pub fn cross_entropy(y: f64, y_hat: f64) -> f64 {
    let p = clamp_probability(y_hat);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}

pub fn cross_entropy_prime(y: f64, y_hat: f64) -> f64 {
    let p = clamp_probability(y_hat);
    -(y / p) + (1.0 - y) / (1.0 - p)
}

/// Joint gradient of cross-entropy through a softmax output layer.
pub fn softmax_cross_entropy_gradient(outputs: &Matrix, targets: &Matrix) -> Result<Matrix> {
    outputs.subtract(targets)
}
