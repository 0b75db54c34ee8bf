use nalgebra as na;

use crate::frame::GrayFrame;

/// Result of one flow invocation: for every input keypoint, its position in
/// the new frame, whether the correspondence was found, and an error
/// estimate. The three arrays share indices with the input set.
#[derive(Debug, Clone, Default)]
pub struct FlowField {
    pub points: Vec<na::Point2<f32>>,
    pub found: Vec<bool>,
    pub errors: Vec<f32>,
}

impl FlowField {
    /// Restrict to found correspondences: parallel (old, new) position
    /// arrays for the subset of keypoints the estimator tracked.
    pub fn found_pairs(
        &self,
        old: &[na::Point2<f32>],
    ) -> (Vec<na::Point2<f32>>, Vec<na::Point2<f32>>) {
        let mut old_found = Vec::with_capacity(self.points.len());
        let mut new_found = Vec::with_capacity(self.points.len());

        for (i, &ok) in self.found.iter().enumerate() {
            if ok && i < old.len() && i < self.points.len() {
                old_found.push(old[i]);
                new_found.push(self.points[i]);
            }
        }

        (old_found, new_found)
    }

    #[inline]
    pub fn found_count(&self) -> usize {
        self.found.iter().filter(|&&f| f).count()
    }
}

/// External sparse optical-flow primitive (pyramidal LK or equivalent).
/// The tracker consumes it through this seam and never implements it.
pub trait FlowEstimator: Send {
    /// Pick an initial set of trackable keypoints in `frame`.
    fn seed(&mut self, frame: &GrayFrame) -> Vec<na::Point2<f32>>;

    /// Track `points` from `prev` to `next`.
    fn track(
        &mut self,
        prev: &GrayFrame,
        next: &GrayFrame,
        points: &[na::Point2<f32>],
    ) -> FlowField;
}
