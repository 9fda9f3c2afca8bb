use crate::frame::Frame;

/// Read-only copy of one layer's firing state, taken at a phase barrier.
///
/// Neurons read their neighbours through this view while they mutate their
/// own state, so no neuron ever observes another's in-progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerActivity {
    width: usize,
    height: usize,
    on: Vec<bool>,
    last_on: Vec<u8>,
}

impl LayerActivity {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            on: vec![false; width * height],
            last_on: vec![0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_on(&self, x: usize, y: usize) -> bool {
        self.on[y * self.width + x]
    }

    #[inline]
    pub fn last_on(&self, x: usize, y: usize) -> u8 {
        self.last_on[y * self.width + x]
    }

    /// Ticks between the neuron's most recent firing and the *next* tick.
    #[inline]
    pub fn lag(&self, x: usize, y: usize, max_history: u8) -> Option<u8> {
        let i = y * self.width + x;
        lag(self.on[i], self.last_on[i], max_history)
    }

    #[inline]
    pub(crate) fn record(&mut self, index: usize, on: bool, last_on: u8) {
        self.on[index] = on;
        self.last_on[index] = last_on;
    }

    pub fn to_frame(&self) -> Frame {
        Frame::from_fn(self.width, self.height, |x, y| self.is_on(x, y))
    }
}

/// Lag of a neuron's last firing, measured from the tick after now.
///
/// On now means lag 1; last on `k` ticks ago means lag `k + 1`, as long as that
/// still fits in the history window.
#[inline]
pub fn lag(is_on: bool, last_on: u8, max_history: u8) -> Option<u8> {
    if is_on {
        Some(1)
    } else if last_on != 0 && last_on < max_history {
        Some(last_on + 1)
    } else {
        None
    }
}

/// Input for the OBSERVE phase of one layer.
#[derive(Debug, Clone, Copy)]
pub enum Feed<'a> {
    /// External frame, read bit by bit by the leaf layer.
    Signal(&'a Frame),
    /// The child layer's fresh activity, OR-pooled by higher layers.
    Pool(&'a LayerActivity),
}
