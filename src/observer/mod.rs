#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::brain::{Brain, Diagnostics};
use crate::frame::Frame;
use crate::layer::Layer;

/// A read-only snapshot of what the brain is doing.
///
/// Design intent:
/// - Observers cannot mutate or steer the brain.
/// - Snapshotting is *on-demand* and allocates; the tick loop stays unchanged.
/// - Grids are plain 0/1 frames so visualizers need nothing from this crate
///   beyond the serialized form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrainSnapshot {
    pub tick: u64,
    pub diagnostics: Diagnostics,
    pub layers: Vec<LayerSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerSnapshot {
    pub layer: usize,
    pub width: usize,
    /// Activation at the end of the last tick.
    pub state: Frame,
    /// Cached result of the layer's last PREDICT.
    pub predicted: Frame,
}

impl LayerSnapshot {
    fn of(layer: &Layer) -> Self {
        Self {
            layer: layer.layer_num(),
            width: layer.width(),
            state: layer.state(),
            predicted: layer.predicted(),
        }
    }
}

pub struct BrainAdapter<'a> {
    brain: &'a Brain,
}

impl<'a> BrainAdapter<'a> {
    pub fn new(brain: &'a Brain) -> Self {
        Self { brain }
    }

    pub fn snapshot(&self) -> BrainSnapshot {
        BrainSnapshot {
            tick: self.brain.tick(),
            diagnostics: self.brain.diagnostics(),
            layers: self.brain.layers().iter().map(LayerSnapshot::of).collect(),
        }
    }

    /// Activation grid of one layer, if it exists.
    pub fn layer_state(&self, layer_num: usize) -> Option<Frame> {
        self.brain.layer(layer_num).map(Layer::state)
    }
}
