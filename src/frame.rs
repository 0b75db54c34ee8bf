use ndarray::{Array2, Array3};
use std::sync::Mutex;

use crate::error::Error;

pub type GrayFrame = Array2<u8>;

/// One synchronized RGB + depth pair from the camera.
#[derive(Debug, Clone)]
pub struct FramePair {
    /// (height, width, 3) RGB buffer.
    pub color: Array3<u8>,
    /// (height, width) depth buffer, millimeters.
    pub depth: Array2<u16>,
    /// Monotonic frame counter assigned by the source.
    pub seq: u64,
}

impl FramePair {
    /// Integer BT.601 luma approximation of the RGB buffer.
    pub fn to_gray(&self) -> GrayFrame {
        let (h, w, _) = self.color.dim();
        let mut gray = Array2::zeros((h, w));

        for y in 0..h {
            for x in 0..w {
                let r = self.color[[y, x, 0]] as u32;
                let g = self.color[[y, x, 1]] as u32;
                let b = self.color[[y, x, 2]] as u32;
                gray[[y, x]] = ((77 * r + 150 * g + 29 * b) >> 8) as u8;
            }
        }

        gray
    }
}

/// Pull-style camera interface. `next_frames` blocks until the next pair is
/// ready and returns `Error::EndOfStream` when the sequence is over.
pub trait FrameSource: Send {
    fn next_frames(&mut self) -> Result<FramePair, Error>;
}

/// Single-slot latest-frame cell for bridging a push-style camera callback
/// to the pull-style tracker loop. Writes overwrite, reads copy out; the
/// lock is held only for the swap, never across computation.
#[derive(Debug, Default)]
pub struct FrameCell {
    slot: Mutex<Option<FramePair>>,
}

impl FrameCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, pair: FramePair) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(pair);
    }

    pub fn latest(&self) -> Option<FramePair> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }
}
