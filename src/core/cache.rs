use crate::prelude::*;

/// Matrices kept from one forward pass for the backward pass that follows it.
///
/// `activation(0)` is the input batch and `activation(l + 1)` is the output of
/// layer `l`; `pre_activation(l)` is that layer's `z`.
#[derive(Debug, Clone)]
pub struct ActivationCache {
    pre_activations: Vec<Matrix>,
    activations: Vec<Matrix>,
}

impl ActivationCache {
    pub(crate) fn new(input: Matrix, num_layers: usize) -> Self {
        let mut activations = Vec::with_capacity(num_layers + 1);
        activations.push(input);
        Self {
            pre_activations: Vec::with_capacity(num_layers),
            activations,
        }
    }

    pub(crate) fn push(&mut self, z: Matrix, a: Matrix) {
        self.pre_activations.push(z);
        self.activations.push(a);
    }

    /// Number of post-activation entries, input included.
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    pub fn num_layers(&self) -> usize {
        self.pre_activations.len()
    }

    pub fn batch_size(&self) -> usize {
        self.activations[0].rows()
    }

    pub fn input(&self) -> &Matrix {
        &self.activations[0]
    }

    pub fn activation(&self, idx: usize) -> &Matrix {
        &self.activations[idx]
    }

    pub fn pre_activation(&self, layer: usize) -> &Matrix {
        &self.pre_activations[layer]
    }

    pub fn output(&self) -> &Matrix {
        &self.activations[self.activations.len() - 1]
    }

    pub fn into_output(mut self) -> Matrix {
        self.activations.swap_remove(self.activations.len() - 1)
    }
}
