use log::{debug, info};
use nalgebra as na;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::bbox::{BBox, Ltwh};
use crate::config::TrackerParams;
use crate::detection::DetectionBatch;
use crate::error::Error;
use crate::flow::FlowEstimator;
use crate::frame::{FramePair, FrameSource, GrayFrame};
use crate::registry::Registry;
use crate::track::Track;

/// Reseed the keypoint set when fewer than this many survive a flow step.
const MIN_KEYPOINTS: usize = 40;

/// Log loop cadence once every this many frames.
const CADENCE_LOG_STRIDE: u64 = 100;

#[derive(Default)]
struct Shared {
    reference_bbox: Mutex<Option<BBox<Ltwh>>>,
    persons: Mutex<Vec<Track>>,
}

/// Real-time driver: pulls frames at a fixed cadence, runs the motion step
/// every tick and the association stages whenever the detection pipeline
/// has produced a batch. The registry is owned here and only here.
pub struct PeopleTracker {
    registry: Registry,
    flow: Box<dyn FlowEstimator>,
    period: Duration,
    prev_gray: Option<GrayFrame>,
    keypoints: Vec<na::Point2<f32>>,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
}

impl PeopleTracker {
    pub fn new(params: TrackerParams, flow: Box<dyn FlowEstimator>) -> Self {
        let period = Duration::from_secs_f32(params.period.max(0.0));

        Self {
            registry: Registry::new(params),
            flow,
            period,
            prev_gray: None,
            keypoints: Vec::new(),
            shared: Arc::new(Shared::default()),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// One loop iteration, callable synchronously (tests drive this
    /// directly). The motion step runs unconditionally; the association
    /// stages run only when `batch` is present. The first frame only
    /// seeds the keypoint set.
    pub fn tick(&mut self, pair: &FramePair, batch: Option<&DetectionBatch>) {
        let gray = pair.to_gray();

        if let Some(prev) = self.prev_gray.as_ref() {
            let field = self.flow.track(prev, &gray, &self.keypoints);
            let (old_found, new_found) = field.found_pairs(&self.keypoints);
            self.registry.step_all(&old_found, &new_found);

            if field.found_count() < MIN_KEYPOINTS {
                info!(
                    "only {} keypoints survive, reseeding",
                    field.found_count()
                );
                self.keypoints = self.flow.seed(&gray);
            } else {
                self.keypoints = field.points;
            }
        } else {
            self.keypoints = self.flow.seed(&gray);
        }
        self.prev_gray = Some(gray);

        if let Some(batch) = batch {
            self.registry.associate(batch);
        }

        self.publish();
    }

    /// Blocking loop: runs until the stop flag is raised or the source
    /// signals exhaustion. Self-pacing: sleeps out the remainder of each
    /// period, and on overrun proceeds immediately with no catch-up.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        detections: &Receiver<DetectionBatch>,
    ) -> Result<(), Error> {
        while !self.stop.load(Ordering::Relaxed) {
            let start = Instant::now();

            let pair = match source.next_frames() {
                Ok(pair) => pair,
                Err(Error::EndOfStream) => {
                    info!("frame stream exhausted, stopping tracker");
                    break;
                }
                Err(err) => return Err(err),
            };

            let batch = detections.try_recv().ok();
            self.tick(&pair, batch.as_ref());

            let elapsed = start.elapsed();
            if pair.seq % CADENCE_LOG_STRIDE == 0 {
                debug!("tracker[{}]: tick took {:?}", pair.seq, elapsed);
            }

            if let Some(remainder) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remainder);
            }
        }

        Ok(())
    }

    /// Spawn the loop on its own thread and hand back the control handle.
    pub fn spawn(
        params: TrackerParams,
        flow: Box<dyn FlowEstimator>,
        mut source: Box<dyn FrameSource>,
        detections: Receiver<DetectionBatch>,
    ) -> TrackerHandle {
        let mut tracker = PeopleTracker::new(params, flow);
        let shared = tracker.shared.clone();
        let stop = tracker.stop.clone();

        let join = std::thread::spawn(move || tracker.run(&mut *source, &detections));

        TrackerHandle { shared, stop, join }
    }

    fn publish(&self) {
        // Persons first: a visible reference box always refers to an
        // already-published person snapshot.
        *lock(&self.shared.persons) = self.registry.persons().to_vec();
        *lock(&self.shared.reference_bbox) = self.registry.reference().map(|t| t.bbox);
    }
}

/// Thread-safe view over a running tracker. All accessors take a
/// short-held lock, copy out and release.
pub struct TrackerHandle {
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    join: JoinHandle<Result<(), Error>>,
}

impl TrackerHandle {
    /// Box of the current reference person, if one is selected.
    pub fn reference_bbox(&self) -> Option<BBox<Ltwh>> {
        *lock(&self.shared.reference_bbox)
    }

    /// Snapshot of the confirmed persons as of the last tick.
    pub fn persons(&self) -> Vec<Track> {
        lock(&self.shared.persons).clone()
    }

    /// Ask the loop to stop after the tick in flight.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn join(self) -> Result<(), Error> {
        match self.join.join() {
            Ok(result) => result,
            Err(_) => Err(Error::FrameSource("tracker thread panicked".into())),
        }
    }
}

#[inline]
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
