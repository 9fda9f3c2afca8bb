//! # neocortex
//!
//! A hierarchical, self-organizing predictive network loosely modelled on
//! cortical columns.
//!
//! Layers of binary neurons connect to spatial neighbours in the same layer
//! (siblings), to the layer below (children) and to the layer above (parents).
//! Every tick runs PREDICT, OBSERVE and LEARN across the whole stack; a
//! spike-timing-dependent rule tunes one strength per connection and delay, and
//! strong channels are used to forecast the next input frame.
//!
//! ## Quick Start
//!
//! ```
//! use neocortex::prelude::*;
//!
//! let cfg = BrainConfig::with_size(1, 64).with_predictive_threshold(1);
//! let mut brain = Brain::new(cfg).unwrap();
//!
//! let frames = neocortex::experiments::sequences::moving_line(8);
//! for frame in &frames {
//!     brain.perceive(frame, true).unwrap();
//! }
//! let forecast = brain.predict();
//! assert_eq!(forecast.width(), 8);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialization of configs, frames and snapshots
//! - `parallel`: Neuron updates within a layer-phase run on rayon
//!
//! ## Modules
//!
//! - [`brain`]: The layer stack and the tick cycle
//! - [`layer`]: Square neuron grids and their wiring
//! - [`neuron`]: Per-neuron PREDICT / OBSERVE / LEARN
//! - [`connection`]: Delay-tuned STDP connections
//! - [`observer`]: Read-only snapshots for visualization
//! - [`experiments`]: Input sequences and a learn-then-replay harness

#[path = "core/activity.rs"]
pub mod activity;

#[path = "core/brain.rs"]
pub mod brain;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/connection.rs"]
pub mod connection;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/frame.rs"]
pub mod frame;

#[path = "core/layer.rs"]
pub mod layer;

#[path = "core/neuron.rs"]
pub mod neuron;

#[path = "core/prng.rs"]
pub mod prng;

pub mod experiments;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use neocortex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::activity::{Feed, LayerActivity};
    pub use crate::brain::{Brain, Diagnostics};
    pub use crate::config::{BrainConfig, Strength};
    pub use crate::connection::{Connection, NeuronId, Transition};
    pub use crate::error::BrainError;
    pub use crate::frame::Frame;
    pub use crate::layer::{ExecutionTier, Layer};
    pub use crate::neuron::{ConnectionBudget, ConnectionKind, LearnTally, Neuron};
    pub use crate::observer::{BrainAdapter, BrainSnapshot, LayerSnapshot};
}
