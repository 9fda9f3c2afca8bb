use core::ops::RangeInclusive;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activity::{Feed, LayerActivity};
use crate::config::BrainConfig;
use crate::connection::NeuronId;
use crate::error::BrainError;
use crate::frame::Frame;
use crate::neuron::{ConnectionKind, LearnTally, Neuron};

/// How neuron updates inside one layer-phase are executed.
///
/// - `Scalar`: one neuron after another (default, works everywhere)
/// - `Parallel`: rayon across the layer's neurons (requires `parallel` feature)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutionTier {
    #[default]
    Scalar,
    Parallel,
}

/// One level of the hierarchy: a square grid of neurons.
///
/// Layer 0 is the leaf layer fed by the external frame. Child and parent
/// links are layer numbers into the owning brain's layer list.
#[derive(Debug, Clone)]
pub struct Layer {
    layer_num: usize,
    width: usize,
    child: Option<usize>,
    parent: Option<usize>,
    // Row-major, width * width.
    neurons: Vec<Neuron>,
}

impl Layer {
    pub fn new(layer_num: usize, neuron_count: usize, cfg: &BrainConfig) -> Self {
        let width = BrainConfig::layer_width(neuron_count);
        let seed = cfg.seed.unwrap_or(1);
        let mut neurons = Vec::with_capacity(width * width);
        for y in 0..width {
            for x in 0..width {
                neurons.push(Neuron::new(
                    NeuronId::new(layer_num, x, y),
                    cfg.max_history,
                    seed,
                ));
            }
        }
        Self {
            layer_num,
            width,
            child: None,
            parent: None,
            neurons,
        }
    }

    #[inline]
    pub fn layer_num(&self) -> usize {
        self.layer_num
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    #[inline]
    pub fn child(&self) -> Option<usize> {
        self.child
    }

    #[inline]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child.is_none()
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn link(&mut self, child: Option<usize>, parent: Option<usize>) {
        self.child = child;
        self.parent = parent;
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neuron(&self, x: usize, y: usize) -> Option<&Neuron> {
        if x >= self.width || y >= self.width {
            return None;
        }
        self.neurons.get(y * self.width + x)
    }

    #[inline]
    fn neuron_mut(&mut self, x: usize, y: usize) -> &mut Neuron {
        &mut self.neurons[y * self.width + x]
    }

    #[inline]
    fn id(&self, x: usize, y: usize) -> NeuronId {
        NeuronId::new(self.layer_num, x, y)
    }

    /// Connect every neuron to all others within the sibling window.
    pub(crate) fn wire_siblings(&mut self, cfg: &BrainConfig) {
        let w = self.width;
        for y in 0..w {
            for x in 0..w {
                let (xs, ys) = window(x, y, cfg.sibling_locality_distance, w);
                for ty in ys {
                    for tx in xs.clone() {
                        let target = self.id(tx, ty);
                        self.neuron_mut(x, y).connect(ConnectionKind::Sibling, target);
                    }
                }
            }
        }
    }

    /// Wire `child` and `parent` (adjacent layers) to each other.
    ///
    /// Each parent neuron reaches into a window around its projection onto the
    /// child grid, and each child neuron into a window around its projection
    /// onto the parent grid. Every edge gets its reverse edge at the same
    /// time; edges that already exist are not duplicated.
    pub(crate) fn wire_pair(child: &mut Layer, parent: &mut Layer, cfg: &BrainConfig) {
        let (cw, pw) = (child.width, parent.width);

        for py in 0..pw {
            for px in 0..pw {
                let (xs, ys) = window(
                    project(px, pw, cw),
                    project(py, pw, cw),
                    cfg.child_locality_distance,
                    cw,
                );
                for cy in ys {
                    for cx in xs.clone() {
                        connect_pair(child, (cx, cy), parent, (px, py));
                    }
                }
            }
        }

        for cy in 0..cw {
            for cx in 0..cw {
                let (xs, ys) = window(
                    project(cx, cw, pw),
                    project(cy, cw, pw),
                    cfg.parent_locality_distance,
                    pw,
                );
                for py in ys {
                    for px in xs.clone() {
                        connect_pair(child, (cx, cy), parent, (px, py));
                    }
                }
            }
        }
    }

    /// Copy the layer's firing state into `into`.
    pub(crate) fn capture(&self, into: &mut LayerActivity) {
        for (i, n) in self.neurons.iter().enumerate() {
            into.record(i, n.is_on(), n.last_on());
        }
    }

    pub fn activity(&self) -> LayerActivity {
        let mut a = LayerActivity::new(self.width, self.width);
        self.capture(&mut a);
        a
    }

    fn map_neurons<T, F>(&mut self, tier: ExecutionTier, f: F) -> T
    where
        T: Send + core::iter::Sum<T>,
        F: Fn(&mut Neuron) -> T + Sync + Send,
    {
        match tier {
            #[cfg(feature = "parallel")]
            ExecutionTier::Parallel => self.neurons.par_iter_mut().map(f).sum(),
            _ => self.neurons.iter_mut().map(f).sum(),
        }
    }

    /// PREDICT for every neuron. Returns how many are predicted to fire.
    pub fn predict(&mut self, view: &[LayerActivity], cfg: &BrainConfig, tier: ExecutionTier) -> usize {
        self.map_neurons(tier, |n| usize::from(n.predict(view, cfg)))
    }

    /// OBSERVE for every neuron. Returns how many are now on.
    ///
    /// The leaf layer only accepts a signal; higher layers only a child pool.
    pub fn observe(&mut self, feed: Feed<'_>, tier: ExecutionTier) -> Result<usize, BrainError> {
        match feed {
            Feed::Signal(frame) if self.is_leaf() => frame.check_shape(self.width, self.width)?,
            Feed::Pool(_) if !self.is_leaf() => {}
            _ => {
                return Err(BrainError::FeedMismatch {
                    layer: self.layer_num,
                })
            }
        }
        Ok(self.map_neurons(tier, |n| {
            n.observe(feed);
            usize::from(n.is_on())
        }))
    }

    /// Drive every neuron straight from `signal`.
    pub fn set(&mut self, signal: &Frame) -> Result<(), BrainError> {
        signal.check_shape(self.width, self.width)?;
        let w = self.width;
        for (i, n) in self.neurons.iter_mut().enumerate() {
            n.set(signal.get(i % w, i / w));
        }
        Ok(())
    }

    /// LEARN for every neuron.
    pub fn learn(&mut self, view: &[LayerActivity], cfg: &BrainConfig, tier: ExecutionTier) -> LearnTally {
        self.map_neurons(tier, |n| n.learn(view, cfg).unwrap_or_default())
    }

    /// Current activation grid.
    pub fn state(&self) -> Frame {
        self.grid(Neuron::is_on)
    }

    /// Cached result of the last PREDICT.
    pub fn predicted(&self) -> Frame {
        self.grid(Neuron::predicted)
    }

    /// Per neuron: 1 where the cached prediction agrees with `signal`.
    pub fn expected(&self, signal: &Frame) -> Result<Frame, BrainError> {
        signal.check_shape(self.width, self.width)?;
        Ok(Frame::from_fn(self.width, self.width, |x, y| {
            self.neurons[y * self.width + x].predicted() == signal.get(x, y)
        }))
    }

    /// Neurons whose cached prediction disagrees with their current state.
    pub fn mispredicted(&self) -> usize {
        self.neurons
            .iter()
            .filter(|n| n.predicted() != n.is_on())
            .count()
    }

    fn grid(&self, f: impl Fn(&Neuron) -> bool) -> Frame {
        Frame::from_fn(self.width, self.width, |x, y| f(&self.neurons[y * self.width + x]))
    }
}

fn connect_pair(child: &mut Layer, (cx, cy): (usize, usize), parent: &mut Layer, (px, py): (usize, usize)) {
    let child_id = child.id(cx, cy);
    let parent_id = parent.id(px, py);
    parent.neuron_mut(px, py).connect(ConnectionKind::Child, child_id);
    child.neuron_mut(cx, cy).connect(ConnectionKind::Parent, parent_id);
}

/// Map a coordinate onto a grid of another size:
/// `round((x + 1) / from * to) - 1`, clamped to the target grid.
pub fn project(x: usize, from: usize, to: usize) -> usize {
    let rel = (x + 1) as f64 / from as f64;
    let c = (rel * to as f64).round() as i64 - 1;
    c.clamp(0, to as i64 - 1) as usize
}

/// Square window of radius `distance` around (x, y), clamped to a
/// `width` x `width` grid. No wraparound.
pub fn window(
    x: usize,
    y: usize,
    distance: usize,
    width: usize,
) -> (RangeInclusive<usize>, RangeInclusive<usize>) {
    let max = width.saturating_sub(1);
    (
        x.saturating_sub(distance)..=(x + distance).min(max),
        y.saturating_sub(distance)..=(y + distance).min(max),
    )
}
