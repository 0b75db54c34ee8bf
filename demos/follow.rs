//! Minimal end-to-end run against a synthetic camera: one person walks
//! right while the detector reports boxes at a third of the frame rate.

use nalgebra as na;
use ndarray::{Array2, Array3};
use std::sync::mpsc;
use std::time::Duration;

use ptrack::bbox::BBox;
use ptrack::frame::GrayFrame;
use ptrack::{
    DetectionBatch, Error, FlowEstimator, FlowField, FramePair, FrameSource, PeopleTracker,
    TrackerParams,
};

struct SyntheticCam {
    seq: u64,
    frames: u64,
}

impl FrameSource for SyntheticCam {
    fn next_frames(&mut self) -> Result<FramePair, Error> {
        if self.seq >= self.frames {
            return Err(Error::EndOfStream);
        }
        self.seq += 1;
        Ok(FramePair {
            color: Array3::zeros((240, 320, 3)),
            depth: Array2::zeros((240, 320)),
            seq: self.seq,
        })
    }
}

struct DriftFlow;

impl FlowEstimator for DriftFlow {
    fn seed(&mut self, frame: &GrayFrame) -> Vec<na::Point2<f32>> {
        let (h, w) = frame.dim();
        let mut points = Vec::new();
        for y in (8..h).step_by(16) {
            for x in (8..w).step_by(16) {
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
        // The whole scene drifts one pixel right per frame.
        FlowField {
            points: points.iter().map(|p| p + na::Vector2::new(1.0, 0.0)).collect(),
            found: vec![true; points.len()],
            errors: vec![0.0; points.len()],
        }
    }
}

fn main() {
    let (tx, rx) = mpsc::channel();

    // Detector thread: one batch every three frame periods, following the
    // same rightward walk as the flow field.
    std::thread::spawn(move || {
        for i in 0..30u32 {
            let left = 100.0 + 3.0 * i as f32;
            let batch = DetectionBatch {
                boxes: vec![BBox::ltwh(left, 60.0, 40.0, 120.0)],
                faces: vec![BBox::xywh(left + 20.0, 80.0, 16.0, 20.0)],
                similarities: vec![0.12],
            };
            if tx.send(batch).is_err() {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    });

    let handle = PeopleTracker::spawn(
        TrackerParams::default(),
        Box::new(DriftFlow),
        Box::new(SyntheticCam {
            seq: 0,
            frames: 90,
        }),
        rx,
    );

    for _ in 0..15 {
        std::thread::sleep(Duration::from_millis(200));
        match handle.reference_bbox() {
            Some(bbox) => println!(
                "reference at ({:.1}, {:.1}) {}x{}",
                bbox.left(),
                bbox.top(),
                bbox.width() as u32,
                bbox.height() as u32
            ),
            None => println!("no reference yet ({} persons)", handle.persons().len()),
        }
    }

    handle.stop();
    match handle.join() {
        Ok(()) => println!("tracker stopped"),
        Err(err) => eprintln!("tracker failed: {}", err),
    }
}
