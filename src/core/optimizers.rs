use crate::prelude::*;
use tracing::warn;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ClipValue {
    None,
    Value(f64),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradientClipConfig {
    pub dw: ClipValue, // for weight gradients
    pub db: ClipValue, // for bias gradients
}

impl Default for GradientClipConfig {
    fn default() -> Self {
        Self {
            dw: ClipValue::None,
            db: ClipValue::None,
        }
    }
}

impl GradientClipConfig {
    pub fn new(dw: Option<f64>, db: Option<f64>) -> Self {
        Self {
            dw: match dw {
                Some(value) => ClipValue::Value(value),
                None => ClipValue::None,
            },
            db: match db {
                Some(value) => ClipValue::Value(value),
                None => ClipValue::None,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        for clip in [self.dw, self.db] {
            if let ClipValue::Value(v) = clip {
                if !(v.is_finite() && v > 0.0) {
                    return Err(NNError::ConfigInvalid(format!(
                        "gradient clip value must be positive and finite, got {}",
                        v
                    )));
                }
            }
        }
        Ok(())
    }
}

/// When the learning rate is multiplied by the decay factor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecaySchedule {
    #[default]
    PerEpoch,
    PerBatch,
}

/// Plain SGD settings. There is no per-parameter optimizer state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub learning_rate_decay: f64,
    pub decay_schedule: DecaySchedule,
    pub gradientclip: GradientClipConfig,
    /// Refuse updates that would leave non-finite parameters.
    pub strict: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate_decay: 1.0,
            decay_schedule: DecaySchedule::PerEpoch,
            gradientclip: GradientClipConfig::default(),
            strict: false,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        let decay = self.learning_rate_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(NNError::ConfigInvalid(format!(
                "learning rate decay must lie in (0, 1], got {}",
                decay
            )));
        }
        self.gradientclip.validate()
    }
}

/// Batch-averaged gradients for one layer, oriented like its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

pub trait Optimization {
    fn optimize(
        &mut self,
        layer: usize,
        grads: Gradients,
        learning_rate: f64,
        config: &OptimizerConfig,
    ) -> Result<()>;
}

/// One SGD step on a layer's parameters.
///
/// The new parameters are built in fresh buffers and only swapped in once
/// complete, so a failure leaves the layer untouched.
pub fn apply_optimization(
    layer: usize,
    weights: &mut Matrix,
    biases: &mut Vec<f64>,
    grads: Gradients,
    learning_rate: f64,
    config: &OptimizerConfig,
) -> Result<()> {
    let Gradients {
        weights: mut dw,
        biases: mut db,
    } = grads;
    if dw.shape() != weights.shape() || db.len() != biases.len() {
        return Err(NNError::ShapeMismatch(format!(
            "gradients {:?}/{} do not match layer {} parameters {:?}/{}",
            dw.shape(),
            db.len(),
            layer,
            weights.shape(),
            biases.len()
        )));
    }

    // Clip gradients based on config
    if let ClipValue::Value(clip_value) = config.gradientclip.dw {
        clip_gradients(dw.as_mut_slice(), clip_value);
    }
    if let ClipValue::Value(clip_value) = config.gradientclip.db {
        clip_gradients(&mut db, clip_value);
    }

    let mut new_weights = weights.try_clone()?;
    for (w, g) in new_weights.as_mut_slice().iter_mut().zip(dw.as_slice()) {
        *w -= learning_rate * g;
    }
    let new_biases: Vec<f64> = biases
        .iter()
        .zip(&db)
        .map(|(b, g)| b - learning_rate * g)
        .collect();

    if !(new_weights.is_finite() && new_biases.iter().all(|b| b.is_finite())) {
        if config.strict {
            return Err(NNError::DivergedTraining { layer });
        }
        warn!(layer, "non-finite parameters after update");
    }

    *weights = new_weights;
    *biases = new_biases;
    Ok(())
}

fn clip_gradients(grad: &mut [f64], clip_value: f64) {
    for g in grad.iter_mut() {
        *g = g.clamp(-clip_value, clip_value);
    }
}
