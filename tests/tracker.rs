use nalgebra as na;
use ndarray::{Array2, Array3};
use std::sync::mpsc;

use ptrack::bbox::BBox;
use ptrack::frame::GrayFrame;
use ptrack::{
    DetectionBatch, Error, FlowEstimator, FlowField, FramePair, FrameSource, PeopleTracker,
    TrackStatus, TrackerParams,
};

/// Serves `count` black frames, then signals exhaustion.
struct ScriptedSource {
    count: u64,
    seq: u64,
}

impl FrameSource for ScriptedSource {
    fn next_frames(&mut self) -> Result<FramePair, Error> {
        if self.seq >= self.count {
            return Err(Error::EndOfStream);
        }
        self.seq += 1;
        Ok(FramePair {
            color: Array3::zeros((120, 160, 3)),
            depth: Array2::zeros((120, 160)),
            seq: self.seq,
        })
    }
}

/// Flow double: every keypoint moves by a constant displacement and is
/// always found. Seeds a regular grid.
struct ShiftFlow {
    d: na::Vector2<f32>,
}

impl FlowEstimator for ShiftFlow {
    fn seed(&mut self, frame: &GrayFrame) -> Vec<na::Point2<f32>> {
        let (h, w) = frame.dim();
        let mut points = Vec::new();
        for y in (4..h).step_by(8) {
            for x in (4..w).step_by(8) {
                points.push(na::Point2::new(x as f32, y as f32));
            }
        }
        points
    }

    fn track(
        &mut self,
        _prev: &GrayFrame,
        _next: &GrayFrame,
        points: &[na::Point2<f32>],
    ) -> FlowField {
        FlowField {
            points: points.iter().map(|p| p + self.d).collect(),
            found: vec![true; points.len()],
            errors: vec![0.0; points.len()],
        }
    }
}

fn test_params() -> TrackerParams {
    TrackerParams {
        patience: 3,
        ref_similarity_threshold: 0.3,
        same_person_threshold: 50.0,
        period: 0.0,
    }
}

fn person_batch() -> DetectionBatch {
    DetectionBatch {
        boxes: vec![BBox::ltwh(40.0, 40.0, 30.0, 60.0)],
        faces: vec![BBox::xywh(55.0, 60.0, 10.0, 12.0)],
        similarities: vec![0.15],
    }
}

#[test]
fn loop_confirms_person_and_selects_reference() {
    let (tx, rx) = mpsc::channel();
    for _ in 0..6 {
        tx.send(person_batch()).unwrap();
    }

    let handle = PeopleTracker::spawn(
        test_params(),
        Box::new(ShiftFlow {
            d: na::Vector2::new(0.5, 0.0),
        }),
        Box::new(ScriptedSource { count: 20, seq: 0 }),
        rx,
    );

    // Wait for the reference selection to become visible; the source
    // runs dry on its own shortly after.
    let mut reference = None;
    for _ in 0..500 {
        if let Some(bbox) = handle.reference_bbox() {
            reference = Some(bbox);
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    let reference = reference.expect("reference person expected");

    let persons = handle.persons();
    assert_eq!(persons.len(), 1);
    assert_eq!(persons[0].status, TrackStatus::Person);
    assert!(persons[0].face.is_some());

    // Snapped to the detection, then carried by flow after the last batch.
    assert!(reference.left() >= 40.0 && reference.left() < 60.0);
    assert!((reference.width() - 30.0).abs() < 1e-3);

    handle.join().expect("clean shutdown on stream exhaustion");
}

#[test]
fn stop_flag_terminates_endless_stream() {
    struct Endless {
        seq: u64,
    }

    impl FrameSource for Endless {
        fn next_frames(&mut self) -> Result<FramePair, Error> {
            self.seq += 1;
            Ok(FramePair {
                color: Array3::zeros((120, 160, 3)),
                depth: Array2::zeros((120, 160)),
                seq: self.seq,
            })
        }
    }

    let (_tx, rx) = mpsc::channel::<DetectionBatch>();
    let handle = PeopleTracker::spawn(
        TrackerParams {
            period: 0.001,
            ..test_params()
        },
        Box::new(ShiftFlow {
            d: na::Vector2::new(0.0, 0.0),
        }),
        Box::new(Endless { seq: 0 }),
        rx,
    );

    std::thread::sleep(std::time::Duration::from_millis(20));
    handle.stop();
    handle.join().expect("stop flag must end the loop cleanly");
}
