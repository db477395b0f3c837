//! Feed-forward networks whose every weight comes from a flat genotype. A network is
//! cheap to rebuild, and is rebuilt for each phenotype rather than mutated in place.

pub mod layer;

pub use layer::Layer;

use crate::error::{DimensionError, Error, Result};
use serde::{Deserialize, Serialize};

pub mod activate {
    pub fn soft_sign(x: f64) -> f64 {
        x / (1. + x.abs())
    }

    pub fn sigmoid(x: f64) -> f64 {
        1. / (1. + (-x).exp())
    }

    pub fn relu(x: f64) -> f64 {
        if x < 0. {
            0.
        } else {
            x
        }
    }
}

/// Activation applied to every output of a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// `x / (1 + |x|)`, bounded and smooth without exponentials
    #[default]
    SoftSign,
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::SoftSign => activate::soft_sign(x),
            Self::Sigmoid => activate::sigmoid(x),
            Self::Tanh => x.tanh(),
            Self::Relu => activate::relu(x),
        }
    }
}

/// The trait for all networks. Evaluation is a pure function of weights and input.
pub trait Network {
    fn inputs(&self) -> usize;

    fn outputs(&self) -> usize;

    /// Total number of parameters, which a genotype driving this network must match
    fn weight_count(&self) -> usize;

    /// Partition `flat` into every layer's weights, in layer order
    fn set_weights(&mut self, flat: &[f64]) -> Result<(), DimensionError>;

    /// The inverse of [Network::set_weights]
    fn weights(&self) -> Vec<f64>;

    fn forward(&self, input: &[f64]) -> Result<Vec<f64>, DimensionError>;
}

/// A fully connected stack of [Layer]s, one per adjacent pair in `topology`
#[derive(Debug, Clone)]
pub struct FeedForward {
    topology: Vec<usize>,
    layers: Vec<Layer>,
}

impl FeedForward {
    pub fn new(topology: &[usize], activation: Activation) -> Result<Self> {
        if topology.len() < 2 {
            return Err(Error::Config(
                "network must have at least input and output layers".into(),
            ));
        }
        if topology.contains(&0) {
            return Err(Error::Config(format!("empty layer in topology {topology:?}")));
        }

        Ok(Self {
            topology: topology.to_vec(),
            layers: topology
                .windows(2)
                .map(|pair| Layer::new(pair[0], pair[1], activation))
                .collect(),
        })
    }

    /// Build a network and load a genotype's parameters into it
    pub fn from_parameters(
        topology: &[usize],
        activation: Activation,
        parameters: &[f64],
    ) -> Result<Self> {
        let mut network = Self::new(topology, activation)?;
        network.set_weights(parameters)?;
        Ok(network)
    }

    /// Parameter count of a network with this topology, without building it
    pub fn weight_count_of(topology: &[usize]) -> usize {
        topology
            .windows(2)
            .map(|pair| (pair[0] + 1) * pair[1])
            .sum()
    }

    #[inline]
    pub fn topology(&self) -> &[usize] {
        &self.topology
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl Network for FeedForward {
    fn inputs(&self) -> usize {
        self.topology[0]
    }

    fn outputs(&self) -> usize {
        self.topology[self.topology.len() - 1]
    }

    fn weight_count(&self) -> usize {
        self.layers.iter().map(Layer::weight_count).sum()
    }

    fn set_weights(&mut self, flat: &[f64]) -> Result<(), DimensionError> {
        let expected = self.weight_count();
        if flat.len() != expected {
            return Err(DimensionError::Weights {
                expected,
                actual: flat.len(),
            });
        }

        let mut offset = 0;
        for layer in self.layers.iter_mut() {
            let count = layer.weight_count();
            layer.set_weights(&flat[offset..offset + count])?;
            offset += count;
        }
        Ok(())
    }

    fn weights(&self) -> Vec<f64> {
        self.layers
            .iter()
            .flat_map(|layer| layer.weights().iter().copied())
            .collect()
    }

    fn forward(&self, input: &[f64]) -> Result<Vec<f64>, DimensionError> {
        if input.len() != self.inputs() {
            return Err(DimensionError::Inputs {
                expected: self.inputs(),
                actual: input.len(),
            });
        }

        let mut signal = input.to_vec();
        for layer in self.layers.iter() {
            signal = layer.process(&signal)?;
        }
        Ok(signal)
    }
}
