pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
pub mod models;
pub mod prelude;
pub mod training;
pub mod utils;

// Re-export types
pub use crate::config::NetworkConfig;
pub use crate::core::{Activation, Dense, LayerTrait, Loss, Matrix};
pub use crate::dataset::Dataset;
pub use crate::error::{NNError, Result};
pub use crate::models::Network;
pub use crate::training::Trainer;
