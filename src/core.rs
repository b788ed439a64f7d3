// src/core.rs
pub mod activations;
pub mod cache;
pub mod initializers;
pub mod layers;
pub mod losses;
pub mod matrix;
pub mod metrics;
pub mod normalization;
pub mod optimizers;

// Re-export commonly used items
pub use activations::{Activation, ActivationShape};
pub use cache::ActivationCache;
pub use initializers::Initializer;
pub use layers::{Dense, LayerTrait};
pub use losses::Loss;
pub use matrix::Matrix;
pub use metrics::Evaluation;
pub use normalization::Normalization;
pub use optimizers::{
    apply_optimization, ClipValue, DecaySchedule, GradientClipConfig, Gradients, Optimization,
    OptimizerConfig,
};
