pub use serde::{Deserialize, Serialize};

pub use ndarray::{Array1, Array2};
pub use ndarray_rand::rand_distr::{Normal, Uniform};
pub use ndarray_rand::RandomExt;

pub use crate::config::{LayerConfig, NetworkConfig};
pub use crate::dataset::Dataset;
pub use crate::error::*;
pub use crate::models::Network;
pub use crate::training::{EpochReport, LogObserver, Trainer, TrainingObserver, TrainingReport};

// Internal re-exports
pub use crate::core::{
    apply_optimization, Activation, ActivationCache, ActivationShape, ClipValue, DecaySchedule,
    Dense, Evaluation, GradientClipConfig, Gradients, Initializer, LayerTrait, Loss, Matrix,
    Normalization, Optimization, OptimizerConfig,
};
