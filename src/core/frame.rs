#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::BrainError;

/// A two-dimensional binary grid: one input frame, or one layer's activation
/// or prediction read back out.
///
/// Cells are stored row-major as 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Frame {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Build a frame from rows. Any non-zero cell counts as on.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, BrainError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(width * height);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != width {
                return Err(BrainError::RaggedFrame {
                    row,
                    len: r.len(),
                    expected: width,
                });
            }
            cells.extend(r.iter().map(|&v| u8::from(v != 0)));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub(crate) fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(u8::from(f(x, y)));
            }
        }
        Self {
            width,
            height,
            cells,
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
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.cells[y * self.width + x] = u8::from(on);
    }

    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.cells.chunks(self.width).map(|r| r.to_vec()).collect()
    }

    /// Fails unless the frame is exactly `width` x `height`.
    pub fn check_shape(&self, width: usize, height: usize) -> Result<(), BrainError> {
        if self.width != width || self.height != height {
            return Err(BrainError::ShapeMismatch {
                width: self.width,
                height: self.height,
                expected_width: width,
                expected_height: height,
            });
        }
        Ok(())
    }
}

impl core::fmt::Display for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
