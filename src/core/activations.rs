use crate::prelude::*;
use std::str::FromStr;

/// Slope applied to negative inputs by [`Activation::LeakyRelu`].
pub const LEAKY_RELU_SLOPE: f64 = 0.01;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    Relu,
    LeakyRelu,
    Tanh,
    Softmax,
}

/// Whether an activation looks at one cell or at a whole row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationShape {
    Elementwise,
    RowWise,
}

impl Activation {
    pub fn shape(&self) -> ActivationShape {
        match self.elementwise() {
            Some(_) => ActivationShape::Elementwise,
            None => ActivationShape::RowWise,
        }
    }

    /// Scalar function and derivative for elementwise kinds.
    fn elementwise(&self) -> Option<(fn(f64) -> f64, fn(f64) -> f64)> {
        match self {
            Self::Sigmoid => Some((sigmoid, sigmoid_prime)),
            Self::Relu => Some((relu, relu_prime)),
            Self::LeakyRelu => Some((leaky_relu, leaky_relu_prime)),
            Self::Tanh => Some((tanh, tanh_prime)),
            Self::Softmax => None,
        }
    }

    pub fn forward(&self, z: &Matrix) -> Result<Matrix> {
        let mut a = z.try_clone()?;
        self.apply_inplace(&mut a);
        Ok(a)
    }

    /// Applies the activation to `m`, row by row for row-wise kinds and cell by
    /// cell otherwise.
    pub fn apply_inplace(&self, m: &mut Matrix) {
        match self.elementwise() {
            Some((f, _)) => m.map_inplace(f),
            None => {
                for r in 0..m.rows() {
                    softmax_inplace(m.row_mut(r));
                }
            }
        }
    }

    /// Derivative evaluated at the pre-activation `z`.
    ///
    /// For softmax this is only the diagonal term `s_i (1 - s_i)` of the Jacobian.
    pub fn derivative(&self, z: &Matrix) -> Result<Matrix> {
        match self.elementwise() {
            Some((_, f_prime)) => z.map(f_prime),
            None => {
                let mut d = z.try_clone()?;
                for r in 0..d.rows() {
                    softmax_prime_inplace(d.row_mut(r));
                }
                Ok(d)
            }
        }
    }

    /// Chains an upstream gradient through the activation: `da ⊙ f'(z)`.
    pub fn backward(&self, z: &Matrix, da: &Matrix) -> Result<Matrix> {
        da.hadamard(&self.derivative(z)?)
    }
}

impl FromStr for Activation {
    type Err = NNError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sigmoid" => Ok(Self::Sigmoid),
            "relu" => Ok(Self::Relu),
            "leaky_relu" | "leakyrelu" => Ok(Self::LeakyRelu),
            "tanh" => Ok(Self::Tanh),
            "softmax" => Ok(Self::Softmax),
            other => Err(NNError::ConfigInvalid(format!(
                "unknown activation '{}'",
                other
            ))),
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn sigmoid_prime(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

pub fn relu(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

pub fn relu_prime(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

pub fn leaky_relu(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        LEAKY_RELU_SLOPE * x
    }
}

pub fn leaky_relu_prime(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        LEAKY_RELU_SLOPE
    }
}

pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

pub fn tanh_prime(x: f64) -> f64 {
    let t = x.tanh();
    1.0 - t * t
}

/// Numerically stable softmax: the row maximum is subtracted before exponentiating.
pub fn softmax_inplace(row: &mut [f64]) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in row.iter_mut() {
        *x /= sum;
    }
}

pub fn softmax(row: &[f64]) -> Vec<f64> {
    let mut out = row.to_vec();
    softmax_inplace(&mut out);
    out
}

fn softmax_prime_inplace(row: &mut [f64]) {
    softmax_inplace(row);
    for s in row.iter_mut() {
        *s *= 1.0 - *s;
    }
}
