#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::info;

use crate::brain::Brain;
use crate::error::BrainError;
use crate::frame::Frame;
use crate::observer::{BrainAdapter, BrainSnapshot};

use super::sequences::blank;

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// Learning passes over the sequence before the replay.
    pub passes: usize,
    /// Keep a snapshot of the whole brain after every tick.
    pub record: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            passes: 1,
            record: false,
        }
    }
}

/// Outcome of [`learn_and_replay`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayReport {
    /// Leaf forecast after each replayed frame.
    pub predicted: Vec<Frame>,
    /// Indices `i` of frames that the forecast made after frame `i - 1` missed.
    pub mismatched: Vec<usize>,
    /// Number of forecasts that had a following frame to compare against.
    pub compared: usize,
    pub snapshots: Vec<BrainSnapshot>,
}

impl ReplayReport {
    pub fn accuracy(&self) -> f32 {
        if self.compared == 0 {
            return 1.0;
        }
        (self.compared - self.mismatched.len()) as f32 / self.compared as f32
    }

    pub fn is_perfect(&self) -> bool {
        self.mismatched.is_empty()
    }
}

/// Teach `brain` a sequence, let it go quiet, then replay without learning
/// and check each forecast against the frame that actually follows.
///
/// The quiet gap is `max_history` blank ticks, so the end of the training run
/// cannot leak into the first replayed forecast.
pub fn learn_and_replay(
    brain: &mut Brain,
    frames: &[Frame],
    opts: ReplayOptions,
) -> Result<ReplayReport, BrainError> {
    let mut report = ReplayReport::default();
    let record = |brain: &Brain, report: &mut ReplayReport| {
        if opts.record {
            report.snapshots.push(BrainAdapter::new(brain).snapshot());
        }
    };

    for _ in 0..opts.passes {
        for frame in frames {
            brain.perceive(frame, true)?;
            record(brain, &mut report);
        }
    }

    let quiet = blank(brain.leaf_width());
    for _ in 0..brain.config().max_history {
        brain.perceive(&quiet, false)?;
        record(brain, &mut report);
    }

    for (i, frame) in frames.iter().enumerate() {
        brain.perceive(frame, false)?;
        let forecast = brain.predict();
        record(brain, &mut report);
        if let Some(next) = frames.get(i + 1) {
            report.compared += 1;
            if forecast != *next {
                report.mismatched.push(i + 1);
            }
        }
        report.predicted.push(forecast);
    }

    info!(
        frames = frames.len(),
        passes = opts.passes,
        compared = report.compared,
        mismatched = report.mismatched.len(),
        "replay finished"
    );
    Ok(report)
}
