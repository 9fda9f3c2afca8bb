#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::BrainError;

/// Integer connection strength. Negative values are inhibitory.
pub type Strength = i32;

/// Simulation parameters, fixed when the [`Brain`](crate::brain::Brain) is built.
///
/// Every neuron and connection reads the same immutable copy; change a value by
/// building a new brain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrainConfig {
    /// Hierarchy depth. Layer 0 is the leaf (input) layer.
    pub num_layers: usize,
    /// Neuron count of the leaf layer; must be a perfect square.
    pub neurons_in_leaf_layer: usize,
    /// Neuron count of layer k+1 relative to layer k.
    pub layer_neuron_ratio: f64,

    /// History window in ticks; also the number of delay buckets per group.
    pub max_history: u8,

    // Chebyshev radii of the connection windows.
    pub sibling_locality_distance: usize,
    pub child_locality_distance: usize,
    pub parent_locality_distance: usize,

    // Share of a neuron's connections per kind (diagnostic accounting only).
    pub sibling_connection_ratio: f64,
    pub child_connection_ratio: f64,
    pub parent_connection_ratio: f64,

    /// Potential a group must exceed to predict firing.
    pub sibling_triggering_threshold: f64,
    pub parent_triggering_threshold: f64,
    pub child_triggering_threshold: f64,
    /// Accumulation stops once potential passes `threshold * threshold_size`.
    pub threshold_size: f64,

    pub max_connection_strength: Strength,
    pub min_connection_strength: Strength,
    /// Minimum strength for a connection to count as predictive.
    pub predictive_connection_threshold: Strength,

    /// STDP boost when the target fired at the channel's delay.
    pub stdp_increment: Strength,
    /// STDP penalty otherwise.
    pub stdp_decrement: Strength,

    /// Probability that an already-predicted firing still learns.
    pub reinforce_fraction: f32,

    /// Skip LEARN for a layer whose predictions matched every neuron this tick.
    pub skip_expected_layers: bool,

    pub seed: Option<u64>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            num_layers: 2,
            neurons_in_leaf_layer: 256,
            layer_neuron_ratio: 0.25,

            max_history: 5,

            sibling_locality_distance: 8, // 17 x 17 window
            child_locality_distance: 2,
            parent_locality_distance: 2,

            sibling_connection_ratio: 0.9,
            child_connection_ratio: 0.05,
            parent_connection_ratio: 0.05,

            sibling_triggering_threshold: 1.0,
            // Feedforward and feedback edges are few but carry more weight each.
            parent_triggering_threshold: 0.001,
            child_triggering_threshold: 0.001,
            threshold_size: 2.0,

            max_connection_strength: Strength::MAX,
            min_connection_strength: -Strength::MAX,
            predictive_connection_threshold: 17,

            stdp_increment: 10,
            stdp_decrement: 1,

            reinforce_fraction: 0.15,

            skip_expected_layers: false,

            seed: None,
        }
    }
}

impl BrainConfig {
    /// Deepest hierarchy the layer geometry is tuned for.
    pub const MAX_LAYERS: usize = 6;

    /// Default parameters with the given hierarchy shape.
    pub fn with_size(num_layers: usize, neurons_in_leaf_layer: usize) -> Self {
        Self {
            num_layers,
            neurons_in_leaf_layer,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_predictive_threshold(mut self, threshold: Strength) -> Self {
        self.predictive_connection_threshold = threshold;
        self
    }

    pub fn with_stdp(mut self, increment: Strength, decrement: Strength) -> Self {
        self.stdp_increment = increment;
        self.stdp_decrement = decrement;
        self
    }

    pub fn with_locality(mut self, sibling: usize, child: usize, parent: usize) -> Self {
        self.sibling_locality_distance = sibling;
        self.child_locality_distance = child;
        self.parent_locality_distance = parent;
        self
    }

    pub fn with_max_history(mut self, max_history: u8) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_layer_ratio(mut self, ratio: f64) -> Self {
        self.layer_neuron_ratio = ratio;
        self
    }

    pub fn with_skip_expected_layers(mut self, skip: bool) -> Self {
        self.skip_expected_layers = skip;
        self
    }

    /// Side length of the (square) leaf layer.
    pub fn leaf_width(&self) -> usize {
        integer_sqrt(self.neurons_in_leaf_layer)
    }

    /// Neuron count of every layer, leaf first.
    pub fn layer_neuron_counts(&self) -> Result<Vec<usize>, BrainError> {
        let mut counts = Vec::with_capacity(self.num_layers);
        for layer in 0..self.num_layers {
            let scaled =
                self.neurons_in_leaf_layer as f64 * self.layer_neuron_ratio.powi(layer as i32);
            let count = scaled.round() as usize;
            if count == 0 {
                return Err(BrainError::EmptyLayer { layer });
            }
            counts.push(count);
        }
        Ok(counts)
    }

    /// Side length of a layer holding `count` neurons.
    pub fn layer_width(count: usize) -> usize {
        let w = integer_sqrt(count);
        if w * w == count {
            w
        } else {
            w + 1
        }
    }

    pub fn validate(&self) -> Result<(), BrainError> {
        if self.num_layers == 0 {
            return Err(BrainError::NoLayers);
        }
        if self.num_layers > Self::MAX_LAYERS {
            return Err(BrainError::invalid(
                "num_layers",
                format!("at most {} layers", Self::MAX_LAYERS),
            ));
        }
        let w = self.leaf_width();
        if self.neurons_in_leaf_layer == 0 || w * w != self.neurons_in_leaf_layer {
            return Err(BrainError::NotPerfectSquare(self.neurons_in_leaf_layer));
        }
        if !(self.layer_neuron_ratio > 0.0 && self.layer_neuron_ratio <= 1.0) {
            return Err(BrainError::invalid(
                "layer_neuron_ratio",
                "must be in (0, 1]",
            ));
        }
        if self.max_history == 0 {
            return Err(BrainError::invalid("max_history", "must be at least 1"));
        }
        if self.min_connection_strength > 0 || self.max_connection_strength < 0 {
            return Err(BrainError::invalid(
                "connection strength bounds",
                "range must contain zero",
            ));
        }
        if self.predictive_connection_threshold < 0 {
            return Err(BrainError::invalid(
                "predictive_connection_threshold",
                "must be non-negative",
            ));
        }
        if self.stdp_increment < 0 || self.stdp_decrement < 0 {
            return Err(BrainError::invalid("stdp", "rates must be non-negative"));
        }
        for (name, t) in [
            ("sibling_triggering_threshold", self.sibling_triggering_threshold),
            ("parent_triggering_threshold", self.parent_triggering_threshold),
            ("child_triggering_threshold", self.child_triggering_threshold),
        ] {
            if !(t >= 0.0) {
                return Err(BrainError::invalid(name, "must be non-negative"));
            }
        }
        if !(self.threshold_size >= 1.0) {
            return Err(BrainError::invalid("threshold_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.reinforce_fraction) {
            return Err(BrainError::invalid(
                "reinforce_fraction",
                "must be in [0, 1]",
            ));
        }
        let ratios = self.sibling_connection_ratio
            + self.child_connection_ratio
            + self.parent_connection_ratio;
        if self.sibling_connection_ratio <= 0.0 || (ratios - 1.0).abs() > 1e-6 {
            return Err(BrainError::invalid(
                "connection ratios",
                format!("must be positive for siblings and sum to 1 (got {ratios})"),
            ));
        }
        self.layer_neuron_counts()?;
        Ok(())
    }
}

fn integer_sqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}
