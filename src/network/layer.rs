use super::Activation;
use crate::error::DimensionError;
use rulinalg::matrix::{BaseMatrix, Matrix};

/// One fully connected layer. Weights are indexed as `[input, output]`, with one extra
/// trailing input row holding the bias, which is fed a constant `1.0`.
#[derive(Debug, Clone)]
pub struct Layer {
    weights: Matrix<f64>,
    activation: Activation,
}

impl Layer {
    pub fn new(inputs: usize, outputs: usize, activation: Activation) -> Self {
        Self {
            weights: Matrix::zeros(inputs + 1, outputs),
            activation,
        }
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.weights.rows() - 1
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.weights.cols()
    }

    #[inline]
    pub fn weight_count(&self) -> usize {
        self.weights.rows() * self.weights.cols()
    }

    /// Row-major weights, bias row last
    #[inline]
    pub fn weights(&self) -> &[f64] {
        self.weights.data()
    }

    pub fn set_weights(&mut self, flat: &[f64]) -> Result<(), DimensionError> {
        if flat.len() != self.weight_count() {
            return Err(DimensionError::Weights {
                expected: self.weight_count(),
                actual: flat.len(),
            });
        }
        self.weights.mut_data().copy_from_slice(flat);
        Ok(())
    }

    pub fn process(&self, input: &[f64]) -> Result<Vec<f64>, DimensionError> {
        if input.len() != self.inputs() {
            return Err(DimensionError::Inputs {
                expected: self.inputs(),
                actual: input.len(),
            });
        }

        let mut biased = Vec::with_capacity(input.len() + 1);
        biased.extend_from_slice(input);
        biased.push(1.);

        let σ = self.activation;
        Ok((Matrix::new(1, biased.len(), biased) * &self.weights)
            .into_vec()
            .into_iter()
            .map(|x| σ.apply(x))
            .collect())
    }
}
