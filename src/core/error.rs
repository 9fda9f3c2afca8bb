use thiserror::Error;

/// Errors raised while building a brain or feeding it frames.
///
/// All of these are precondition failures: the call is rejected before any
/// neuron state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrainError {
    #[error("brain needs at least one layer")]
    NoLayers,

    #[error("leaf layer neuron count {0} is not a perfect square")]
    NotPerfectSquare(usize),

    #[error("layer {layer} would have no neurons; reduce num_layers or raise the layer ratio")]
    EmptyLayer { layer: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("frame is {width}x{height} but the leaf layer is {expected_width}x{expected_height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("frame row {row} has {len} cells, expected {expected}")]
    RaggedFrame {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("layer {layer} cannot be observed from this feed")]
    FeedMismatch { layer: usize },
}

impl BrainError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
