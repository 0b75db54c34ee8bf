use nalgebra as na;

use crate::bbox::{BBox, Ltwh, Xywh};

/// Fewest found correspondences inside a box for its flow step to apply.
const MIN_FLOW_POINTS: usize = 3;

/// How far outside a box (px) a keypoint may sit and still vote for it.
const FLOW_MARGIN: f32 = 8.0;

/// Counter a fresh face binding starts from; decremented once per
/// detection cycle with no face update, dropped when it goes negative.
pub const FACE_PATIENCE: i32 = 5;

/// Counter a fresh candidate starts from; enough to survive one flow-only
/// refresh while waiting for its second detection.
pub const CANDIDATE_SEED: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    /// Hypothesis without enough evidence yet. Never owns a face.
    Candidate,
    /// Confirmed, steerable-to person.
    Person,
}

/// A face box bound to one confirmed person, with its distance to the
/// reference identity. Owned exclusively by that person.
#[derive(Debug, Clone)]
pub struct FaceBinding {
    pub bbox: BBox<Xywh>,
    pub similarity: f32,
    pub counter: i32,
}

impl FaceBinding {
    pub fn new(bbox: BBox<Xywh>, similarity: f32) -> Self {
        Self {
            bbox,
            similarity,
            counter: FACE_PATIENCE,
        }
    }
}

/// One physical-person hypothesis: a box, a liveness counter and, once
/// confirmed, an optional face binding and the reference flag.
#[derive(Debug, Clone)]
pub struct Track {
    pub bbox: BBox<Ltwh>,
    pub status: TrackStatus,
    pub counter: i32,
    pub face: Option<FaceBinding>,
    pub is_reference: bool,
}

impl Track {
    pub fn candidate(bbox: BBox<Ltwh>) -> Self {
        Self {
            bbox,
            status: TrackStatus::Candidate,
            counter: CANDIDATE_SEED,
            face: None,
            is_reference: false,
        }
    }

    #[inline]
    pub fn is_person(&self) -> bool {
        self.status == TrackStatus::Person
    }

    /// Promote a candidate in place. The counter is capped at `patience`.
    pub fn promote(&mut self, patience: i32) {
        self.status = TrackStatus::Person;
        self.counter = patience;
    }

    /// Move the box by the mean displacement of the flow correspondences
    /// local to it. `old` and `new` are parallel found-keypoint arrays.
    /// With too few local correspondences the box is left where it is;
    /// eviction stays a lifecycle concern.
    pub fn step(&mut self, old: &[na::Point2<f32>], new: &[na::Point2<f32>]) {
        let mut disp = na::Vector2::new(0.0f32, 0.0f32);
        let mut count = 0usize;

        for (o, n) in old.iter().zip(new.iter()) {
            if self.bbox.contains_point(*o, FLOW_MARGIN) {
                disp += n - o;
                count += 1;
            }
        }

        if count >= MIN_FLOW_POINTS {
            self.bbox.translate(disp / count as f32);
        }
    }

    /// Attach or replace the face binding. Counter restarts from
    /// `FACE_PATIENCE`; the caller's end-of-cycle pass then ages it.
    pub fn set_face(&mut self, bbox: BBox<Xywh>, similarity: f32) {
        self.face = Some(FaceBinding::new(bbox, similarity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(disp: na::Vector2<f32>, pts: &[(f32, f32)]) -> (Vec<na::Point2<f32>>, Vec<na::Point2<f32>>) {
        let old: Vec<_> = pts.iter().map(|&(x, y)| na::Point2::new(x, y)).collect();
        let new: Vec<_> = old.iter().map(|p| p + disp).collect();
        (old, new)
    }

    #[test]
    fn step_follows_local_mean_displacement() {
        let mut track = Track::candidate(BBox::ltwh(10.0, 10.0, 50.0, 100.0));
        let (old, new) = pairs(
            na::Vector2::new(5.0, -2.0),
            &[(20.0, 20.0), (30.0, 60.0), (40.0, 90.0), (500.0, 500.0)],
        );

        track.step(&old, &new);

        // The far-away keypoint contributes nothing.
        assert_eq!(track.bbox, BBox::ltwh(15.0, 8.0, 50.0, 100.0));
    }

    #[test]
    fn step_with_too_few_points_leaves_box() {
        let mut track = Track::candidate(BBox::ltwh(10.0, 10.0, 50.0, 100.0));
        let (old, new) = pairs(na::Vector2::new(5.0, 5.0), &[(20.0, 20.0), (30.0, 30.0)]);

        track.step(&old, &new);

        assert_eq!(track.bbox, BBox::ltwh(10.0, 10.0, 50.0, 100.0));
    }

    #[test]
    fn promotion_caps_counter_at_patience() {
        let mut track = Track::candidate(BBox::ltwh(0.0, 0.0, 10.0, 10.0));
        track.counter = 9;
        track.promote(5);

        assert!(track.is_person());
        assert_eq!(track.counter, 5);
    }
}
