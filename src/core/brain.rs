#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{debug, info, trace};

use crate::activity::{Feed, LayerActivity};
use crate::config::BrainConfig;
use crate::connection::NeuronId;
use crate::error::BrainError;
use crate::frame::Frame;
use crate::layer::{ExecutionTier, Layer};
use crate::neuron::{ConnectionBudget, LearnTally, Neuron};

/// Counters describing the graph and the most recent tick.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostics {
    pub tick: u64,
    pub layer_count: usize,
    pub neuron_count: usize,
    /// Distinct source -> target pairs.
    pub edge_count: usize,
    /// Delay-tuned connections (edges x delays).
    pub connection_count: usize,
    pub predictive_connection_count: usize,
    pub active_per_layer: Vec<usize>,
    pub predicted_per_layer: Vec<usize>,
    pub budget: ConnectionBudget,
    pub last_learn: LearnTally,
}

/// A stack of layers driven one tick at a time.
///
/// ```
/// use neocortex::prelude::*;
///
/// let mut brain = Brain::new(BrainConfig::with_size(2, 64).with_seed(7)).unwrap();
/// let frame = Frame::zeros(8, 8);
/// brain.perceive(&frame, true).unwrap();
/// let forecast = brain.predict();
/// assert_eq!(forecast.width(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct Brain {
    cfg: BrainConfig,
    layers: Vec<Layer>,
    // Phase-barrier copy of every layer's firing state.
    activity: Vec<LayerActivity>,
    tier: ExecutionTier,
    tick: u64,
    last_learn: LearnTally,
}

impl Brain {
    /// Build every layer, link the stack, then wire all connections.
    pub fn new(cfg: BrainConfig) -> Result<Self, BrainError> {
        cfg.validate()?;
        let counts = cfg.layer_neuron_counts()?;
        if cfg.leaf_width() > u16::MAX as usize {
            return Err(BrainError::invalid(
                "neurons_in_leaf_layer",
                "leaf layer is too wide",
            ));
        }

        let mut layers: Vec<Layer> = counts
            .iter()
            .enumerate()
            .map(|(k, &count)| Layer::new(k, count, &cfg))
            .collect();

        let n = layers.len();
        for (k, layer) in layers.iter_mut().enumerate() {
            let child = k.checked_sub(1);
            let parent = (k + 1 < n).then_some(k + 1);
            layer.link(child, parent);
        }

        // Child and parent targets must all exist before any wiring.
        for layer in &mut layers {
            layer.wire_siblings(&cfg);
        }
        for k in 1..n {
            let (below, above) = layers.split_at_mut(k);
            Layer::wire_pair(&mut below[k - 1], &mut above[0], &cfg);
        }

        let activity = layers.iter().map(Layer::activity).collect();

        let brain = Self {
            cfg,
            layers,
            activity,
            tier: ExecutionTier::default(),
            tick: 0,
            last_learn: LearnTally::default(),
        };

        let d = brain.diagnostics();
        info!(
            layers = d.layer_count,
            widths = ?brain.layers.iter().map(Layer::width).collect::<Vec<_>>(),
            neurons = d.neuron_count,
            edges = d.edge_count,
            connections = d.connection_count,
            "brain built"
        );
        Ok(brain)
    }

    /// Default parameters with the given hierarchy shape.
    pub fn with_layers(num_layers: usize, neurons_in_leaf_layer: usize) -> Result<Self, BrainError> {
        Self::new(BrainConfig::with_size(num_layers, neurons_in_leaf_layer))
    }

    pub fn config(&self) -> &BrainConfig {
        &self.cfg
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, layer_num: usize) -> Option<&Layer> {
        self.layers.get(layer_num)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn leaf_width(&self) -> usize {
        self.layers[0].width()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.layers.get(id.layer())?.neuron(id.x(), id.y())
    }

    pub fn set_execution_tier(&mut self, tier: ExecutionTier) {
        self.tier = tier;
    }

    pub fn execution_tier(&self) -> ExecutionTier {
        self.tier
    }

    /// The tier that actually runs, given the compiled features.
    pub fn effective_execution_tier(&self) -> ExecutionTier {
        match self.tier {
            ExecutionTier::Scalar => ExecutionTier::Scalar,
            ExecutionTier::Parallel => {
                if cfg!(feature = "parallel") {
                    ExecutionTier::Parallel
                } else {
                    ExecutionTier::Scalar
                }
            }
        }
    }

    /// Run one tick: PREDICT bottom-up, OBSERVE bottom-up, then LEARN.
    ///
    /// The frame must match the leaf layer exactly; a mismatched frame is
    /// rejected before any state changes.
    pub fn perceive(&mut self, frame: &Frame, learn: bool) -> Result<(), BrainError> {
        let w = self.leaf_width();
        frame.check_shape(w, w)?;
        let tier = self.effective_execution_tier();

        // PREDICT from the state left by the previous tick.
        let mut predicted = Vec::with_capacity(self.layers.len());
        for layer in &mut self.layers {
            predicted.push(layer.predict(&self.activity, &self.cfg, tier));
        }

        // OBSERVE; each layer pools from its freshly observed child.
        let mut active = Vec::with_capacity(self.layers.len());
        for k in 0..self.layers.len() {
            let (below, rest) = self.activity.split_at_mut(k);
            let feed = match below.last() {
                None => Feed::Signal(frame),
                Some(child) => Feed::Pool(child),
            };
            active.push(self.layers[k].observe(feed, tier)?);
            self.layers[k].capture(&mut rest[0]);
        }

        // LEARN against this tick's final states.
        self.last_learn = LearnTally::default();
        if learn {
            for layer in &mut self.layers {
                if self.cfg.skip_expected_layers && layer.mispredicted() == 0 {
                    trace!(layer = layer.layer_num(), "fully expected, skipping learn");
                    continue;
                }
                self.last_learn = self.last_learn + layer.learn(&self.activity, &self.cfg, tier);
            }
        }

        self.tick += 1;
        debug!(
            tick = self.tick,
            ?active,
            ?predicted,
            learned = self.last_learn.neurons,
            entered = self.last_learn.entered,
            left = self.last_learn.left,
            "perceive"
        );
        Ok(())
    }

    /// Forecast of the next frame, as a leaf-layer grid.
    ///
    /// Every layer is re-predicted from the activity captured this tick.
    pub fn predict(&mut self) -> Frame {
        let tier = self.effective_execution_tier();
        // Top to bottom, though no layer reads another's prediction, so the
        // order does not change the result.
        for layer in self.layers.iter_mut().rev() {
            layer.predict(&self.activity, &self.cfg, tier);
        }
        self.layers[0].predicted()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut d = Diagnostics {
            tick: self.tick,
            layer_count: self.layers.len(),
            last_learn: self.last_learn,
            ..Default::default()
        };
        for layer in &self.layers {
            let mut active = 0;
            let mut predicted = 0;
            for n in layer.neurons() {
                d.neuron_count += 1;
                d.edge_count += n.edge_count();
                d.connection_count += n.connection_count();
                d.predictive_connection_count += n.predictive_count();
                d.budget = d.budget + n.connection_budget(&self.cfg);
                active += usize::from(n.is_on());
                predicted += usize::from(n.predicted());
            }
            d.active_per_layer.push(active);
            d.predicted_per_layer.push(predicted);
        }
        d
    }
}
