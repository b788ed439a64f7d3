use crate::prelude::*;
use std::path::Path;

fn default_decay() -> f64 {
    0.95
}

fn default_batch_size() -> usize {
    32
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LayerConfig {
    pub width: usize,
    pub activation: Activation,
}

/// Everything needed to build and train a [`Network`].
///
/// ```
/// use rmlp::prelude::*;
///
/// let config = NetworkConfig::new(2)
///     .add_dense(4, Activation::Sigmoid)
///     .add_dense(1, Activation::Sigmoid)
///     .loss(Loss::Mse)
///     .learning_rate(0.5)
///     .seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub layers: Vec<LayerConfig>,
    pub loss: Loss,
    pub learning_rate: f64,
    #[serde(default = "default_decay")]
    pub learning_rate_decay: f64,
    #[serde(default)]
    pub decay_schedule: DecaySchedule,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub gradient_clip: GradientClipConfig,
}

impl NetworkConfig {
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size,
            layers: Vec::new(),
            loss: Loss::Mse,
            learning_rate: 0.01,
            learning_rate_decay: default_decay(),
            decay_schedule: DecaySchedule::PerEpoch,
            batch_size: default_batch_size(),
            seed: None,
            strict: false,
            gradient_clip: GradientClipConfig::default(),
        }
    }

    pub fn add_dense(mut self, width: usize, activation: Activation) -> Self {
        self.layers.push(LayerConfig { width, activation });
        self
    }

    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn learning_rate_decay(mut self, decay: f64, schedule: DecaySchedule) -> Self {
        self.learning_rate_decay = decay;
        self.decay_schedule = schedule;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn gradient_clip(mut self, clip: GradientClipConfig) -> Self {
        self.gradient_clip = clip;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.width).unwrap_or(0)
    }

    pub fn optimizer(&self) -> OptimizerConfig {
        OptimizerConfig {
            learning_rate_decay: self.learning_rate_decay,
            decay_schedule: self.decay_schedule,
            gradientclip: self.gradient_clip.clone(),
            strict: self.strict,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(NNError::ConfigInvalid(
                "input size must be greater than 0".to_string(),
            ));
        }
        if self.layers.is_empty() {
            return Err(NNError::ConfigInvalid("Model has no layers".to_string()));
        }
        if let Some(i) = self.layers.iter().position(|l| l.width == 0) {
            return Err(NNError::ConfigInvalid(format!("layer {} has width 0", i)));
        }
        if self.batch_size == 0 {
            return Err(NNError::ConfigInvalid(
                "batch size must be greater than 0".to_string(),
            ));
        }
        validate_learning_rate(self.learning_rate)?;
        self.optimizer().validate()
    }
}

pub(crate) fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(NNError::ConfigInvalid(format!(
            "learning rate must be positive, got {}",
            learning_rate
        )));
    }
    Ok(())
}
