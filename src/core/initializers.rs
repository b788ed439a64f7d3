use crate::prelude::*;
use rand::rngs::StdRng;
use ndarray_rand::rand_distr::Distribution;
use rand::SeedableRng;

/// He-scaled parameter initializer with an explicit random source.
#[derive(Debug, Clone)]
pub struct Initializer {
    rng: StdRng,
}

impl Initializer {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// `num_neurons x fan_in` weights from `N(0, sqrt(2 / fan_in))`.
    pub fn weights(&mut self, num_neurons: usize, fan_in: usize) -> Result<Matrix> {
        if fan_in == 0 {
            return Err(NNError::ConfigInvalid(
                "fan-in must be greater than 0".to_string(),
            ));
        }
        let std_dev = (2.0 / fan_in as f64).sqrt();
        let normal = Normal::new(0.0, std_dev)
            .map_err(|e| NNError::ConfigInvalid(format!("weight distribution: {}", e)))?;
        let mut w = Matrix::zeros(num_neurons, fan_in)?;
        for x in w.as_mut_slice().iter_mut() {
            *x = normal.sample(&mut self.rng);
        }
        Ok(w)
    }

    /// Biases drawn uniformly from `[0, 1)`.
    pub fn biases(&mut self, num_neurons: usize) -> Result<Vec<f64>> {
        let uniform = Uniform::new(0.0, 1.0);
        let mut b = Matrix::zeros(1, num_neurons)?;
        for x in b.as_mut_slice().iter_mut() {
            *x = uniform.sample(&mut self.rng);
        }
        Ok(b.into_vec())
    }
}
